use std::collections::HashSet;

use crate::error::{ConfigError, PacketError, SimError};
use crate::net::{HostConfig, Network, NetworkBuilder, NodeId, Position, Protocol, Summary};
use crate::queue::RedConfig;
use crate::sim::{SimConfig, Tick};
use crate::topo::dumbbell::{DumbbellOpts, DumbbellTopology, build_dumbbell};
use crate::topo::random_mesh::network_from_config;

/// RED 阈值远高于任何实际队长：不会触发 RED 丢包
fn quiet_red() -> RedConfig {
    RedConfig {
        min_th: 1_000.0,
        max_th: 2_000.0,
        max_p: 0.1,
        wq: 0.1,
    }
}

fn dumbbell_net(
    protocols: Vec<Protocol>,
    buffer_size: usize,
    red: RedConfig,
    seed: u64,
) -> (Network, DumbbellTopology) {
    let mut b = NetworkBuilder::default();
    let opts = DumbbellOpts {
        buffer_size,
        host: HostConfig {
            protocols,
            ..HostConfig::default()
        },
        ..DumbbellOpts::default()
    };
    let topo = build_dumbbell(&mut b, &opts);
    let net = b.build(red, seed).expect("build dumbbell");
    (net, topo)
}

fn assert_conserved(net: &Network) {
    let s = net.stats();
    assert_eq!(
        s.generated_pkts,
        s.delivered_pkts
            + s.dropped_overflow
            + s.dropped_red
            + s.undeliverable_pkts
            + net.in_flight_count() as u64,
        "tick {:?}: {s:?}",
        net.now()
    );
}

fn delivered_ids(net: &Network) -> Vec<u64> {
    net.host_ids()
        .iter()
        .filter_map(|&h| net.host(h))
        .flat_map(|h| h.received().iter().map(|(_, p)| p.id))
        .collect()
}

fn live_ids(net: &Network) -> Vec<u64> {
    let mut ids = Vec::new();
    for node in net.nodes() {
        for q in node.queues().queues() {
            ids.extend(q.iter().map(|p| p.id));
        }
    }
    for link in net.links() {
        ids.extend(link.in_flight().map(|p| p.id));
    }
    ids
}

#[test]
fn builder_rejects_degenerate_topologies() {
    let red = RedConfig::default();

    let mut b = NetworkBuilder::default();
    b.add_router("r0", Position::default(), 10);
    assert!(matches!(b.build(red, 1), Err(ConfigError::NoHosts)));

    let mut b = NetworkBuilder::default();
    b.add_host("h0", Position::default(), HostConfig::default());
    assert!(matches!(b.build(red, 1), Err(ConfigError::NoRouters)));

    // router -> host only: the host has no way out
    let mut b = NetworkBuilder::default();
    let h = b.add_host("h0", Position::default(), HostConfig::default());
    let r = b.add_router("r0", Position::default(), 10);
    b.connect(r, h, 1);
    assert!(matches!(
        b.build(red, 1),
        Err(ConfigError::MissingEgress { host }) if host == h
    ));

    let mut b = NetworkBuilder::default();
    let h = b.add_host("h0", Position::default(), HostConfig::default());
    let r = b.add_router("r0", Position::default(), 10);
    b.connect(h, r, 1);
    let down = b.connect(r, h, 1);
    b.set_egress(h, down);
    assert!(matches!(b.build(red, 1), Err(ConfigError::BadEgress { .. })));

    let mut b = NetworkBuilder::default();
    let h = b.add_host("h0", Position::default(), HostConfig::default());
    let r = b.add_router("r0", Position::default(), 10);
    b.connect(h, r, 0);
    assert!(matches!(b.build(red, 1), Err(ConfigError::ZeroDelay { .. })));

    let mut b = NetworkBuilder::default();
    let h = b.add_host("h0", Position::default(), HostConfig::default());
    b.add_router("r0", Position::default(), 10);
    b.connect(h, NodeId(7), 1);
    assert!(matches!(
        b.build(red, 1),
        Err(ConfigError::UnknownNode(NodeId(7)))
    ));
}

#[test]
fn builder_rejects_bad_parameters_before_any_tick() {
    let build = |red: RedConfig, buffer: usize, alpha_on: f64| {
        let mut b = NetworkBuilder::default();
        let h = b.add_host(
            "h0",
            Position::default(),
            HostConfig {
                alpha_on,
                ..HostConfig::default()
            },
        );
        let r = b.add_router("r0", Position::default(), buffer);
        b.connect(h, r, 1);
        b.connect(r, h, 1);
        b.build(red, 1)
    };

    let bad_red = RedConfig {
        min_th: 3.0,
        max_th: 1.0,
        ..RedConfig::default()
    };
    assert!(matches!(build(bad_red, 10, 1.5), Err(ConfigError::InvalidRed(_))));
    assert!(matches!(
        build(RedConfig::default(), 0, 1.5),
        Err(ConfigError::ZeroBuffer)
    ));
    assert!(matches!(
        build(RedConfig::default(), 10, 0.0),
        Err(ConfigError::InvalidAlpha { .. })
    ));

    let net = build(RedConfig::default(), 10, 1.5).expect("valid");
    assert_eq!(net.now(), Tick::ZERO);
    assert_eq!(net.stats().generated_pkts, 0);
}

#[test]
fn tcp_sequence_numbers_follow_destination_queue_length() {
    let (mut net, topo) = dumbbell_net(vec![Protocol::Tcp, Protocol::Udp], 10, quiet_red(), 3);
    let h = topo.left_hosts[0];
    let peer = topo.right_hosts[0];

    let a = net.enqueue(h, Protocol::Tcp, peer).expect("enqueue");
    let b = net.enqueue(h, Protocol::Tcp, peer).expect("enqueue");
    let c = net.enqueue(h, Protocol::Tcp, h).expect("enqueue");
    let d = net.enqueue(h, Protocol::Tcp, peer).expect("enqueue");
    net.enqueue(h, Protocol::Udp, peer).expect("enqueue");
    assert_eq!((a, b, c, d), (0, 1, 2, 3));

    let host = net.host(h).expect("host");
    let seqs: Vec<Option<u64>> = host
        .queues()
        .tcp_queue(peer)
        .expect("queue to peer")
        .iter()
        .map(|p| p.seq())
        .collect();
    assert_eq!(seqs, vec![Some(0), Some(1), Some(2)]);
    assert_eq!(
        host.queues().tcp_queue(h).expect("self queue").iter().next().and_then(|p| p.seq()),
        Some(0)
    );
    assert_eq!(host.queues().udp_len(), 1);
    assert_eq!(net.stats().generated_pkts, 5);
    assert_eq!(net.in_flight_count(), 5);
}

#[test]
fn enqueue_rejects_bad_input_at_the_call_site() {
    let (mut net, topo) = dumbbell_net(vec![Protocol::Udp], 10, quiet_red(), 3);
    let h = topo.left_hosts[0];

    assert!(matches!(
        net.enqueue_tagged(h, "icmp", h),
        Err(SimError::Packet(PacketError::UnknownProtocol(_)))
    ));
    assert!(matches!(
        net.enqueue(topo.r0, Protocol::Udp, h),
        Err(SimError::NotAHost(r)) if r == topo.r0
    ));
    assert!(matches!(
        net.enqueue(h, Protocol::Udp, topo.r1),
        Err(SimError::NotAHost(_))
    ));
    assert!(matches!(
        net.enqueue(h, Protocol::Udp, NodeId(99)),
        Err(SimError::UnknownNode(NodeId(99)))
    ));
    assert_eq!(net.stats().generated_pkts, 0);

    assert_eq!(net.enqueue_tagged(h, "UDP", h).expect("valid tag"), 0);
}

#[test]
fn self_addressed_packet_is_delivered_back() {
    let (mut net, topo) = dumbbell_net(vec![Protocol::Udp], 1_000, quiet_red(), 5);
    let h = topo.left_hosts[0];

    let id = net.enqueue(h, Protocol::Udp, h).expect("enqueue");
    net.run(300);

    let host = net.host(h).expect("host");
    let (at, pkt) = host
        .received()
        .iter()
        .find(|(_, p)| p.id == id)
        .expect("self-addressed packet delivered");
    assert_eq!((pkt.src, pkt.dst), (h, h));
    assert!(at.0 >= 1);
    assert_eq!(net.stats().undeliverable_pkts, 0);
    assert_conserved(&net);
}

#[test]
fn tcp_window_caps_host_injection() {
    let (mut net, topo) = dumbbell_net(vec![Protocol::Tcp], 1_000, quiet_red(), 9);
    net.run(500);

    for h in topo.left_hosts.iter().chain(&topo.right_hosts) {
        let host = net.host(*h).expect("host");
        assert!(host.counters().sent <= 1);
        assert_eq!(host.counters().sent + host.cwnd(), 1);
    }
    assert!(net.stats().sent_pkts <= 2);
    assert_conserved(&net);
}

#[test]
fn packets_cross_at_most_one_link_per_tick() {
    let (mut net, topo) = dumbbell_net(vec![Protocol::Udp], 1_000, quiet_red(), 13);
    net.enqueue(topo.left_hosts[0], Protocol::Udp, topo.right_hosts[0])
        .expect("enqueue");

    net.step();
    assert_eq!(net.stats().delivered_pkts, 0);
    assert_eq!(net.router(topo.r0).expect("r0").queues().total_len(), 0);
    assert_eq!(net.router(topo.r1).expect("r1").queues().total_len(), 0);

    net.run(400);
    for h in topo.left_hosts.iter().chain(&topo.right_hosts) {
        for (at, pkt) in net.host(*h).expect("host").received() {
            // self-addressed: host -> router -> host; otherwise through both routers
            let hops = if pkt.src == pkt.dst { 2 } else { 3 };
            assert!(
                at.0 >= pkt.created_at.0 + hops - 1,
                "pkt {} created {:?} delivered {:?}",
                pkt.id,
                pkt.created_at,
                at
            );
        }
    }
}

#[test]
fn red_and_overflow_drops_are_counted_separately() {
    // wq = 1 pins avg to the candidate length: an empty queue admits with p = 0.5,
    // anything already queued is a forced drop, so the buffer never fills.
    let red = RedConfig {
        min_th: 0.5,
        max_th: 1.5,
        max_p: 1.0,
        wq: 1.0,
    };
    let (mut net, topo) = dumbbell_net(vec![Protocol::Udp], 10, red, 17);
    net.run(2_000);

    let s = net.stats().clone();
    assert!(s.dropped_red > 0);
    assert_eq!(s.dropped_overflow, 0);
    let per_router: u64 = [topo.r0, topo.r1]
        .iter()
        .map(|&r| net.router(r).expect("router").counters().dropped_red)
        .sum();
    assert_eq!(per_router, s.dropped_red);
    for r in [topo.r0, topo.r1] {
        assert!(net.router(r).expect("router").queues().queues().all(|q| q.len() <= 1));
    }
    assert_conserved(&net);
}

#[test]
fn unroutable_packets_are_dropped_and_counted() {
    // two islands: h0 - r0 and h1 - r1 with no router mesh
    let mut b = NetworkBuilder::default();
    let cfg = HostConfig {
        protocols: vec![Protocol::Udp],
        ..HostConfig::default()
    };
    let h0 = b.add_host("h0", Position::default(), cfg.clone());
    let h1 = b.add_host("h1", Position::default(), cfg);
    let r0 = b.add_router("r0", Position::default(), 100);
    let r1 = b.add_router("r1", Position::default(), 100);
    b.connect(h0, r0, 1);
    b.connect(r0, h0, 1);
    b.connect(h1, r1, 1);
    b.connect(r1, h1, 1);
    let mut net = b.build(quiet_red(), 23).expect("build");

    let id = net.enqueue(h0, Protocol::Udp, h1).expect("enqueue");
    net.run(100);

    assert!(net.stats().undeliverable_pkts >= 1);
    assert!(net.router(r0).expect("r0").counters().undeliverable >= 1);
    assert!(!delivered_ids(&net).contains(&id));
    assert!(!live_ids(&net).contains(&id));
    assert_conserved(&net);
}

#[test]
fn router_queues_stay_within_buffer_every_tick() {
    let cfg = SimConfig {
        hosts: 8,
        routers: 2,
        buffer_size: 4,
        red: RedConfig {
            max_p: 0.0,
            ..RedConfig::default()
        },
        protocols: vec!["udp".to_string()],
        seed: 31,
        ..SimConfig::default()
    };
    let (mut net, topo) = network_from_config(&cfg).expect("build");

    for _ in 0..2_000 {
        net.step();
        for &r in &topo.routers {
            let router = net.router(r).expect("router");
            assert!(
                router.queues().queues().all(|q| q.len() <= cfg.buffer_size),
                "router {r:?} over capacity at {:?}",
                net.now()
            );
        }
    }
    assert_eq!(net.stats().dropped_red, 0);
    assert_conserved(&net);
}

#[test]
fn conservation_holds_packet_by_packet() {
    let cfg = SimConfig {
        hosts: 5,
        routers: 3,
        red: RedConfig {
            min_th: 1.0,
            max_th: 3.0,
            max_p: 0.2,
            wq: 0.1,
        },
        seed: 77,
        ..SimConfig::default()
    };
    let (mut net, _) = network_from_config(&cfg).expect("build");

    for _ in 0..15 {
        net.run(100);
        assert_conserved(&net);
    }

    let delivered = delivered_ids(&net);
    let live = live_ids(&net);
    assert_eq!(delivered.len() as u64, net.stats().delivered_pkts);
    assert_eq!(live.len(), net.in_flight_count());

    let mut seen = HashSet::new();
    for id in delivered.iter().chain(&live) {
        assert!(*id < net.stats().generated_pkts);
        assert!(seen.insert(*id), "packet {id} accounted twice");
    }
    assert_eq!(
        seen.len() as u64 + net.stats().dropped_pkts(),
        net.stats().generated_pkts
    );
}

#[test]
fn reference_scenario_is_reproducible_with_overflow_drops_only() {
    let cfg = SimConfig {
        seed: 2024,
        ticks: 3_000,
        ..SimConfig::default()
    };
    let run = || {
        let (mut net, _) = network_from_config(&cfg).expect("build");
        net.run(cfg.ticks);
        net
    };
    let a = run();
    let b = run();

    assert_eq!(a.now(), Tick(3_000));
    assert_eq!(a.stats(), b.stats());
    assert_eq!(delivered_ids(&a), delivered_ids(&b));
    assert!(a.stats().generated_pkts > 0);
    assert!(a.stats().sent_pkts > 0);
    assert_eq!(a.stats().dropped_red, 0);
    assert_eq!(a.stats().undeliverable_pkts, 0);
    assert_eq!(a.stats().dropped_pkts(), a.stats().dropped_overflow);
    assert_conserved(&a);
}

#[test]
fn summary_reports_derived_statistics() {
    let cfg = SimConfig {
        seed: 4,
        ..SimConfig::default()
    };
    let (mut net, _) = network_from_config(&cfg).expect("build");
    net.run(500);

    let summary = Summary::from_network(&net);
    assert_eq!(summary.ticks, 500);
    assert_eq!(summary.nodes.len(), cfg.hosts + cfg.routers);
    assert_eq!(summary.stats, *net.stats());
    assert_eq!(summary.in_flight_pkts, net.in_flight_count());
    assert!(summary.avg_router_queue_len >= 0.0);
    assert!(summary.avg_router_queue_len <= cfg.buffer_size as f64);
    assert!((0.0..=1.0).contains(&summary.full_router_queue_fraction));
    assert!(summary.line().starts_with("summary ticks=500 "));

    let routers = summary.nodes.iter().filter(|n| n.red_avg.is_some()).count();
    assert_eq!(routers, cfg.routers);
}
