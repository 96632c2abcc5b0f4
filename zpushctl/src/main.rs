use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use zpushconfig::Config;
use zpushconnect::oof::parse_date;
use zpushconnect::{
    Account, AllowHosts, Capabilities, CertificateTrust, ClientInfo, Connection, FolderNode,
    OofSettings, OofState, OofTarget, UreqTransport, render_vfreebusy,
};

fn cli() -> Command {
    Command::new("zpushctl")
        .about("Out-of-office, free/busy, signatures and shared folders on a Z-Push server")
        .arg(
            Arg::new("config")
                .help("Configuration directory")
                .long("config")
                .short('c')
                .value_name("DIR")
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("oof")
                .about("Out-of-office settings")
                .subcommand_required(true)
                .subcommand(Command::new("get").about("Shows the current settings"))
                .subcommand(
                    Command::new("set")
                        .about("Replaces the settings")
                        .arg(
                            Arg::new("state")
                                .help("disabled, enabled or scheduled")
                                .required(true)
                                .index(1),
                        )
                        .arg(Arg::new("from").long("from").value_name("DATE"))
                        .arg(Arg::new("till").long("till").value_name("DATE"))
                        .arg(Arg::new("internal").long("internal").value_name("TEXT"))
                        .arg(Arg::new("external").long("external").value_name("TEXT"))
                        .arg(
                            Arg::new("external-unknown")
                                .long("external-unknown")
                                .value_name("TEXT"),
                        ),
                ),
        )
        .subcommand(
            Command::new("freebusy")
                .about("Prints the availability of a recipient as VFREEBUSY")
                .arg(Arg::new("recipient").required(true).index(1))
                .arg(
                    Arg::new("days")
                        .long("days")
                        .value_name("N")
                        .default_value("7")
                        .value_parser(clap::value_parser!(u32)),
                ),
        )
        .subcommand(Command::new("signatures").about("Lists the signatures"))
        .subcommand(
            Command::new("folders")
                .about("Lists the folders a user can share")
                .arg(Arg::new("user").required(true).index(1)),
        )
        .subcommand(
            Command::new("shares")
                .about("Lists the shared folders of this device")
                .arg(
                    Arg::new("all")
                        .help("Include folders not yet synchronised")
                        .long("all")
                        .short('a')
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.get_log_min_level().to_lowercase()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn connect(config: &Config) -> Result<Connection> {
    let server = config.get_server_url().context("server.url is not configured")?;
    let user = config.get_user_name().context("server.user is not configured")?;
    let password = config.get_password().context("server.password is not configured")?;
    let account = Account::new(&server, user, password, config.get_device_id()?)
        .with_device_type(config.get_device_type());

    let client = ClientInfo::new(
        config.get_client_plugin(),
        config.get_client_capabilities().iter().collect::<Capabilities>(),
    );
    let transport = UreqTransport::new(Duration::from_secs(config.get_http_timeout_secs()));
    let trust = CertificateTrust::new(AllowHosts::new(config.get_accept_invalid_certificates()));

    debug!(account = ?account, "Connecting");
    Ok(Connection::new(
        account,
        client,
        Arc::new(transport),
        Arc::new(trust),
    ))
}

fn oof_get(connection: &Connection) -> Result<()> {
    let settings = connection.get_oof()?;
    match settings.state {
        OofState::Disabled => println!("state: disabled"),
        OofState::Enabled => println!("state: enabled"),
        OofState::TimeBased { from, till } => {
            println!("state: scheduled from {from} till {till}")
        }
    }
    for target in OofTarget::ALL {
        if let Some(message) = settings.message(target) {
            println!("{}: {message}", target.element_name());
        }
    }
    Ok(())
}

fn date_arg(args: &ArgMatches, name: &str) -> Result<DateTime<Utc>> {
    let value = args
        .get_one::<String>(name)
        .with_context(|| format!("--{name} is required for a scheduled reply"))?;
    Ok(parse_date(value)?)
}

fn oof_set(connection: &Connection, args: &ArgMatches) -> Result<()> {
    let state = match args.get_one::<String>("state").map(String::as_str) {
        Some("disabled") => OofState::Disabled,
        Some("enabled") => OofState::Enabled,
        Some("scheduled") => OofState::TimeBased {
            from: date_arg(args, "from")?,
            till: date_arg(args, "till")?,
        },
        other => bail!("unknown state {other:?}"),
    };

    let mut settings = OofSettings::new(state);
    for (name, target) in [
        ("internal", OofTarget::Internal),
        ("external", OofTarget::ExternalKnown),
        ("external-unknown", OofTarget::ExternalUnknown),
    ] {
        settings.set_message(target, args.get_one::<String>(name).cloned());
    }
    connection.set_oof(settings)?;
    info!("Out-of-office settings updated");
    Ok(())
}

fn freebusy(connection: &Connection, args: &ArgMatches) -> Result<()> {
    let recipient = args
        .get_one::<String>("recipient")
        .context("missing recipient")?;
    let days = args.get_one::<u32>("days").copied().unwrap_or(7);
    let start = Utc::now();
    let end = start + chrono::Duration::days(days.into());

    match connection.free_busy(recipient, start, Some(end))? {
        Some(data) => {
            let url = connection.webservice_url(zpushconnect::WebService::Info, None);
            print!("{}", render_vfreebusy(recipient, &url, Utc::now(), &data));
        }
        None => bail!("no free/busy information for {recipient}"),
    }
    Ok(())
}

fn signatures(connection: &Connection) -> Result<()> {
    let signatures = connection.signatures()?;
    for signature in signatures.all.values() {
        let mut marks = Vec::new();
        if signatures.new_message.as_deref() == Some(signature.id.as_str()) {
            marks.push("new");
        }
        if signatures.replyforward_message.as_deref() == Some(signature.id.as_str()) {
            marks.push("reply");
        }
        println!(
            "{}\t{}\t{}\t{}",
            signature.id,
            signature.name,
            if signature.is_html { "html" } else { "text" },
            marks.join(",")
        );
    }
    Ok(())
}

fn print_folder(node: FolderNode<'_>, depth: usize) {
    let folder = node.folder();
    println!(
        "{:indent$}{} [{}] {:?}",
        "",
        folder.display_name,
        folder.server_id,
        folder.sync_type,
        indent = depth * 2
    );
    for child in node.children() {
        print_folder(child, depth + 1);
    }
}

fn folders(connection: &Connection, args: &ArgMatches) -> Result<()> {
    let user = args.get_one::<String>("user").context("missing user")?;
    let tree = connection.user_folders(user)?;
    for root in tree.roots() {
        print_folder(root, 0);
    }
    Ok(())
}

fn shares(connection: &Connection, args: &ArgMatches) -> Result<()> {
    let all = args.get_flag("all");
    for share in connection.current_shares()? {
        if !all && !share.is_synced() {
            continue;
        }
        let access = match share.permissions() {
            Some(p) if p.write => "rw",
            Some(p) if p.read => "r",
            Some(_) => "-",
            None => "not synced",
        };
        println!("{}\t{}\t{:?}\t{access}", share.store, share.name, share.sync_type);
    }
    Ok(())
}

fn main() -> Result<()> {
    let matches = cli().get_matches();

    let directory = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("");
    let config = Config::load_config(directory)?;
    init_logging(&config);

    let connection = connect(&config)?;
    match matches.subcommand() {
        Some(("oof", oof)) => match oof.subcommand() {
            Some(("get", _)) => oof_get(&connection),
            Some(("set", args)) => oof_set(&connection, args),
            _ => unreachable!("oof requires a subcommand"),
        },
        Some(("freebusy", args)) => freebusy(&connection, args),
        Some(("signatures", _)) => signatures(&connection),
        Some(("folders", args)) => folders(&connection, args),
        Some(("shares", args)) => shares(&connection, args),
        _ => unreachable!("a subcommand is required"),
    }
}
