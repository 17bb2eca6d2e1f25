use anyhow::Result;
use mlflow_experiments::{
    backend::{config::ServerConfig, rest::Server},
    Client, CreateOptions, DeleteOptions, Experiment, GetOptions, ListOptions,
};
use nanorand::{WyRand, RNG};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

struct Args {
    address: String,
    namespace: String,
    keep: bool,
}

impl Args {
    pub fn from_env() -> Result<Self> {
        let mut args = pico_args::Arguments::from_env();
        Ok(Args {
            address: args
                .opt_value_from_str(["-a", "--address"])?
                .unwrap_or_else(|| ServerConfig::default().address),
            namespace: args
                .opt_value_from_str(["-n", "--namespace"])?
                .unwrap_or_else(|| "default".to_string()),
            keep: args.contains(["-k", "--keep"]),
        })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::from_env()?;
    let config = ServerConfig {
        address: args.address,
        timeout: Some(Duration::from_secs(10)),
    };
    let client = Server::from_config(&config)?;

    let seed = SystemTime::now().duration_since(UNIX_EPOCH)?.as_nanos() as u64;
    let mut rng = WyRand::new_seed(seed);
    let mut experiment = Experiment::new(format!("demo-{:04x}", rng.generate::<u16>()));
    experiment.tags_mut().set("created-by", "mlflow-experiments");

    let create = CreateOptions::in_namespace(args.namespace.as_str());
    client.create_experiment(&mut experiment, &create)?;
    println!(
        "Created experiment {} ({}) at {}",
        experiment.name(),
        experiment.experiment_id(),
        experiment.creation_timestamp()
    );

    let mut fetched = Experiment::new(experiment.name());
    client.get_experiment_by_name(&mut fetched, &GetOptions::in_namespace(args.namespace.as_str()))?;
    println!("Found it again by name with id {}", fetched.experiment_id());

    let listed = client.list_experiments(&ListOptions::in_namespace(args.namespace.as_str()))?;
    println!("Namespace {} holds {} experiment(s)", args.namespace, listed.len());
    for listed in &listed {
        println!("  {} {}", listed.experiment_id(), listed.name());
    }

    if !args.keep {
        client.delete_experiment(&mut experiment, &DeleteOptions::default())?;
        println!("Deleted the experiment again");
    }
    Ok(())
}
