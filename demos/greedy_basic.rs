use greedy_corrclust::{cluster, disagreement_cost, GreedyOptions, StrategyKind, WeightMatrix};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Two planted groups {0, 1, 2} and {3, 4, 5}, with one noisy pair.
    let group = |i: usize| i / 3;
    let mut scores = WeightMatrix::from_fn(6, |i, j| match (i == j, group(i) == group(j)) {
        (true, _) => 0.0,
        (false, true) => 1.0,
        (false, false) => -1.0,
    });
    scores.set(4, 2, 0.5);
    scores.set(2, 4, 0.5);

    let options = GreedyOptions {
        seed: Some(42),
        identity_order: false,
    };

    let strategy = match std::env::args().nth(1) {
        Some(name) => vec![name.parse::<StrategyKind>()?],
        None => StrategyKind::ALL.to_vec(),
    };

    for kind in strategy {
        let links = cluster(&scores, kind, &options);
        let res = links.clusters();
        println!(
            ">{kind}: {} clusters, cost {:.2}",
            res.len(),
            disagreement_cost(&scores, &res)
        );
        for (cid, members) in res.clusters.iter().enumerate() {
            println!("  cluster {cid}: {members:?}");
        }
    }
    Ok(())
}
