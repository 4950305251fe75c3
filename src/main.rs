use std::{
    io::{self, Read, Write},
    sync::Arc,
    time::SystemTime,
};

use anyhow::{bail, Context, Result};
use aws_config::BehaviorVersion;
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use tracing::{info, span, Level};
use tracing_subscriber::EnvFilter;

use bucketfs::{
    adapters,
    fs::{FileStoreAdapter, ObjectFS},
    model::store::SignOptions,
    options::{Config, RequestOptions, Visibility},
    util::{self, object::Provider},
};

fn cli() -> Command {
    let path = || Arg::new("PATH").required(true).index(1);
    let pairs = |id: &'static str, long: &'static str| {
        Arg::new(id)
            .long(long)
            .value_name("KEY=VALUE")
            .action(ArgAction::Append)
    };

    Command::new("bucketfs")
        .version(clap::crate_version!())
        .about("Filesystem operations on an object store bucket")
        .subcommand_required(true)
        .arg(
            Arg::new("BUCKET_URI")
                .required(true)
                .index(1)
                .help("s3://bucket[/prefix] or gs://bucket[/prefix]"),
        )
        .arg(
            Arg::new("endpoint")
                .long("endpoint")
                .env("AWS_ENDPOINT_URL")
                .help("Custom S3 endpoint; its scheme decides transport security"),
        )
        .arg(
            Arg::new("path-style")
                .long("path-style")
                .action(ArgAction::SetTrue)
                .help("Address buckets as a path segment instead of a host name"),
        )
        .arg(pairs("option", "option").help("Default request option for every write"))
        .subcommand(
            Command::new("ls")
                .about("List a directory")
                .arg(Arg::new("DIR").index(1).default_value(""))
                .arg(
                    Arg::new("recursive")
                        .short('r')
                        .long("recursive")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("cat").about("Print an object").arg(path()))
        .subcommand(
            Command::new("put")
                .about("Write an object from a file or stdin")
                .arg(path())
                .arg(Arg::new("file").long("file").value_name("FILE"))
                .arg(Arg::new("visibility").long("visibility"))
                .arg(Arg::new("mimetype").long("mimetype"))
                .arg(pairs("option", "option").short('o')),
        )
        .subcommand(Command::new("rm").about("Delete an object").arg(path()))
        .subcommand(
            Command::new("rmdir")
                .about("Delete a directory and everything below it")
                .arg(Arg::new("DIR").required(true).index(1)),
        )
        .subcommand(
            Command::new("mkdir")
                .about("Create a directory marker")
                .arg(Arg::new("DIR").required(true).index(1))
                .arg(Arg::new("visibility").long("visibility")),
        )
        .subcommand(
            Command::new("cp")
                .about("Copy an object")
                .arg(Arg::new("SRC").required(true).index(1))
                .arg(Arg::new("DST").required(true).index(2)),
        )
        .subcommand(
            Command::new("mv")
                .about("Move an object (copy, then delete)")
                .arg(Arg::new("SRC").required(true).index(1))
                .arg(Arg::new("DST").required(true).index(2)),
        )
        .subcommand(Command::new("stat").about("Show object metadata").arg(path()))
        .subcommand(Command::new("exists").about("Check whether an object exists").arg(path()))
        .subcommand(
            Command::new("chmod")
                .about("Set object visibility")
                .arg(path())
                .arg(
                    Arg::new("VISIBILITY")
                        .required(true)
                        .index(2)
                        .value_parser(["public", "private"]),
                ),
        )
        .subcommand(Command::new("visibility").about("Show object visibility").arg(path()))
        .subcommand(Command::new("url").about("Public URL of an object").arg(path()))
        .subcommand(
            Command::new("presign")
                .about("Time limited URL for an object")
                .arg(path())
                .arg(Arg::new("expires").long("expires").default_value("15m"))
                .arg(
                    Arg::new("put")
                        .long("put")
                        .action(ArgAction::SetTrue)
                        .help("Sign an upload instead of a download"),
                )
                .arg(pairs("param", "param").short('p')),
        )
}

fn config_from(matches: &ArgMatches, id: &str) -> Result<Config> {
    let mut config = Config::new();
    if let Some(pairs) = matches.get_many::<String>(id) {
        for pair in pairs {
            config = config.with_pair(pair)?;
        }
    }

    Ok(config)
}

fn build_client(provider: Provider, matches: &ArgMatches) -> Result<Arc<dyn adapters::Object>> {
    match provider {
        Provider::AWS => {
            let mut loader = aws_config::defaults(BehaviorVersion::latest());
            if let Some(endpoint) = matches.get_one::<String>("endpoint") {
                loader = loader.endpoint_url(endpoint);
            }
            let sdk_config = util::poll::poll_until_ready(loader.load());

            let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(matches.get_flag("path-style"))
                .build();

            Ok(Arc::new(aws_sdk_s3::Client::from_conf(s3_config)))
        }
        Provider::GCS => gcs_client(),
    }
}

#[cfg(feature = "gcs")]
fn gcs_client() -> Result<Arc<dyn adapters::Object>> {
    use google_cloud_storage::client::{Client, ClientConfig};

    let config = util::poll::poll_until_ready(ClientConfig::default().with_auth())
        .context("failed to load gcs credentials")?;

    Ok(Arc::new(Client::new(config)))
}

#[cfg(not(feature = "gcs"))]
fn gcs_client() -> Result<Arc<dyn adapters::Object>> {
    bail!("gs:// buckets require building with the `gcs` feature")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let line = serde_json::to_string(value).context("failed to encode output")?;
    println!("{}", line);
    Ok(())
}

fn value<'a>(matches: &'a ArgMatches, id: &str) -> &'a str {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .unwrap_or_default()
}

fn run(fs: &ObjectFS, command: &str, matches: &ArgMatches) -> Result<()> {
    let arg = |id: &str| value(matches, id);

    match command {
        "ls" => print_json(&fs.list_contents(arg("DIR"), matches.get_flag("recursive"))?),
        "cat" => {
            let result = fs.read(arg("PATH"))?;
            io::stdout()
                .write_all(&result.contents)
                .context("failed to write to stdout")
        }
        "put" => {
            let contents = match matches.get_one::<String>("file") {
                Some(file) => {
                    std::fs::read(file).with_context(|| format!("failed to read: {}", file))?
                }
                None => {
                    let mut buf = Vec::new();
                    io::stdin()
                        .read_to_end(&mut buf)
                        .context("failed to read stdin")?;
                    buf
                }
            };

            let mut config = config_from(matches, "option")?;
            for id in ["visibility", "mimetype"] {
                if let Some(value) = matches.get_one::<String>(id) {
                    config = config.with(id, value);
                }
            }

            print_json(&fs.write(arg("PATH"), &contents, &config)?)
        }
        "rm" => Ok(fs.delete(arg("PATH"))?),
        "rmdir" => Ok(fs.delete_dir(arg("DIR"))?),
        "mkdir" => {
            let mut config = Config::new();
            if let Some(visibility) = matches.get_one::<String>("visibility") {
                config = config.with("visibility", visibility);
            }
            print_json(&fs.create_dir(arg("DIR"), &config)?)
        }
        "cp" => Ok(fs.copy(arg("SRC"), arg("DST"))?),
        "mv" => Ok(fs.rename(arg("SRC"), arg("DST"))?),
        "stat" => print_json(&fs.get_metadata(arg("PATH"))?),
        "exists" => {
            let path = arg("PATH");
            print_json(&serde_json::json!({ "path": path, "exists": fs.has(path) }))
        }
        "chmod" => {
            let visibility: Visibility = arg("VISIBILITY").parse()?;
            print_json(&fs.set_visibility(arg("PATH"), visibility)?)
        }
        "visibility" => {
            let path = arg("PATH");
            let visibility = fs.get_visibility(path)?;
            print_json(&serde_json::json!({ "path": path, "visibility": visibility }))
        }
        "url" => {
            println!("{}", fs.get_url(arg("PATH"))?);
            Ok(())
        }
        "presign" => {
            let expires = humantime::parse_duration(arg("expires"))
                .with_context(|| format!("invalid duration: {}", arg("expires")))?;
            let expires_at = SystemTime::now() + expires;

            let mut options = SignOptions::new();
            let params = config_from(matches, "param")?;
            for (name, param) in params.settings() {
                options.insert(name.clone(), param.clone());
            }

            let url = if matches.get_flag("put") {
                fs.get_upload_url(arg("PATH"), expires_at, &options)?
            } else {
                fs.get_temporary_url(arg("PATH"), expires_at, &options)?
            };
            println!("{}", url);
            Ok(())
        }
        other => bail!("unknown command: {}", other),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let span = span!(Level::INFO, "main", context = "main");
    let _e = span.enter();
    info!("called");

    let matches = cli().get_matches();

    let bucket_uri = value(&matches, "BUCKET_URI");
    let provider = util::object::parse_provider_from_uri(bucket_uri)?;
    let (bucket, prefix) = util::object::parse_location_from_uri(bucket_uri)?;
    info!(bucket = bucket, prefix = prefix, "args");

    let defaults =
        RequestOptions::from_config(&config_from(&matches, "option")?, &RequestOptions::default())?;
    let client = build_client(provider, &matches)?;
    let fs = ObjectFS::new(client, bucket, prefix, defaults);

    match matches.subcommand() {
        Some((command, sub_matches)) => run(&fs, command, sub_matches),
        None => bail!("no command given"),
    }
}
