use clap::{Args, Parser, Subcommand, ValueEnum};
use radius_client::{
    AttributeValue, Client, ClientConfig, ClientError, ClientResult, Code, Reply, RequestKind,
};
use std::path::PathBuf;
use std::process;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// radcli - RADIUS test client (RFC 2865 / 2866 / 5997)
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "radcli")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// RADIUS server address
    #[arg(short, long)]
    server: Option<String>,

    /// RADIUS shared secret
    #[arg(short = 'k', long)]
    secret: Option<String>,

    /// RADIUS authentication port
    #[arg(long)]
    auth_port: Option<u16>,

    /// RADIUS accounting port
    #[arg(long)]
    acct_port: Option<u16>,

    /// Retransmissions after the first attempt
    #[arg(long)]
    retries: Option<u32>,

    /// Seconds to wait for each reply
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Dictionary file (built-in RFC dictionary if omitted)
    #[arg(short, long, value_name = "FILE")]
    dictionary: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send an Access-Request and show Accept/Reject
    Auth(Credentials),
    /// Authenticate and list reply attributes with notes
    Authz(Credentials),
    /// Send an Accounting-Request
    Acct(AcctArgs),
    /// Check whether the server is alive (Status-Server, then an auth probe)
    Status(ProbeArgs),
}

#[derive(Args, Debug)]
struct Credentials {
    #[arg(short, long, default_value = "testrunner")]
    user: String,

    #[arg(short, long = "pass", default_value = "run123")]
    password: String,
}

#[derive(Args, Debug)]
struct AcctArgs {
    /// Acct-Status-Type
    #[arg(short = 't', long = "type", value_enum, default_value_t = StatusType::Start)]
    status_type: StatusType,

    #[arg(short, long, default_value = "testrunner")]
    user: String,

    /// Acct-Session-Id (random if omitted)
    #[arg(long)]
    session_id: Option<String>,

    /// Acct-Session-Time in seconds
    #[arg(long)]
    session_time: Option<u32>,
}

#[derive(Args, Debug)]
struct ProbeArgs {
    /// Username for the auth probe fallback
    #[arg(long, default_value = "testrunner")]
    probe_user: String,

    /// Password for the auth probe fallback
    #[arg(long, default_value = "run123")]
    probe_pass: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum StatusType {
    Start,
    Stop,
    Interim,
}

impl StatusType {
    fn value_name(self) -> &'static str {
        match self {
            StatusType::Start => "Start",
            StatusType::Stop => "Stop",
            StatusType::Interim => "Interim-Update",
        }
    }
}

const EXIT_OK: i32 = 0;
const EXIT_REJECTED: i32 = 1;
const EXIT_FAILURE: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(EXIT_FAILURE);
        }
    };

    let client = match Client::from_config(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(EXIT_FAILURE);
        }
    };

    let code = match &cli.command {
        Command::Auth(creds) => auth(&client, creds, false).await,
        Command::Authz(creds) => auth(&client, creds, true).await,
        Command::Acct(args) => acct(&client, args).await,
        Command::Status(args) => status(&client, args).await,
    };
    process::exit(code);
}

/// Defaults, then the config file, then `RADIUS_*` variables, then flags
fn load_config(cli: &Cli) -> Result<ClientConfig, ClientError> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            ClientConfig::from_file(path)?
        }
        None => ClientConfig::default(),
    };
    config.apply_env()?;

    if let Some(server) = &cli.server {
        config.server = server.clone();
    }
    if let Some(secret) = &cli.secret {
        config.secret = secret.clone();
    }
    if let Some(port) = cli.auth_port {
        config.auth_port = port;
    }
    if let Some(port) = cli.acct_port {
        config.acct_port = port;
    }
    if let Some(retries) = cli.retries {
        config.retries = retries;
    }
    if let Some(seconds) = cli.timeout {
        config.timeout_ms = seconds.saturating_mul(1000);
    }
    if let Some(path) = &cli.dictionary {
        config.dictionary = Some(path.clone());
    }

    config.validate()?;
    Ok(config)
}

fn print_connection(config: &ClientConfig, port: u16) {
    println!(
        "Server: {}:{}  Secret: {}",
        config.server,
        port,
        config.masked_secret()
    );
}

fn attribute_note(name: &str) -> &'static str {
    match name {
        "Session-Timeout" => "Max session duration (seconds)",
        "Reply-Message" => "Server greeting / message to client",
        "Framed-Protocol" => "L2 framing for the session",
        "Framed-IP-Address" => "IP assigned to client",
        "Framed-IP-Netmask" => "Subnet mask for client",
        "Idle-Timeout" => "Max idle time before disconnect (seconds)",
        "Service-Type" => "Type of service authorized",
        "Class" => "Opaque value echoed in accounting",
        _ => "",
    }
}

fn print_attributes(reply: &Reply, annotate: bool) {
    let mut attributes = reply.attributes();
    if attributes.is_empty() {
        println!("No reply attributes.");
        return;
    }
    if annotate {
        attributes.sort_by(|(a, _), (b, _)| a.cmp(b));
    }

    let width = attributes
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0);
    for (name, value) in &attributes {
        let note = if annotate { attribute_note(name) } else { "" };
        if note.is_empty() {
            println!("  {:<width$}  {}", name, value, width = width);
        } else {
            println!("  {:<width$}  {}  ({})", name, value, note, width = width);
        }
    }
}

async fn auth(client: &Client, creds: &Credentials, annotate: bool) -> i32 {
    print_connection(client.config(), client.config().auth_port);

    let result = match client.access_request(&creds.user, &creds.password) {
        Ok(request) => client.send(&request).await,
        Err(e) => Err(e),
    };
    let reply = match result {
        Ok(reply) => reply,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_FAILURE;
        }
    };

    if annotate {
        println!("\nResult: {}  (user={})", reply.code(), creds.user);
    } else {
        println!("\nResult: {}", reply.code());
    }
    print_attributes(&reply, annotate);

    if reply.is_accept() { EXIT_OK } else { EXIT_REJECTED }
}

async fn acct(client: &Client, args: &AcctArgs) -> i32 {
    let config = client.config();
    print_connection(config, config.acct_port);

    let session_id = args.session_id.clone().unwrap_or_else(random_session_id);
    println!(
        "Session-Id: {}  Status-Type: {}",
        session_id,
        args.status_type.value_name()
    );

    match send_accounting(client, args, &session_id).await {
        Ok(reply) => {
            println!("\nResult: {}", reply.code());
            EXIT_OK
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_FAILURE
        }
    }
}

async fn send_accounting(
    client: &Client,
    args: &AcctArgs,
    session_id: &str,
) -> ClientResult<Reply> {
    let mut request = client.new_request(RequestKind::AccountingRequest)?;
    request.add("User-Name", args.user.as_str())?;
    request.add("Acct-Session-Id", session_id)?;
    request.add("Acct-Status-Type", args.status_type.value_name())?;
    request.add("NAS-Identifier", client.config().nas_identifier.as_str())?;
    request.add("NAS-IP-Address", "127.0.0.1")?;
    if let Some(seconds) = args.session_time {
        request.add("Acct-Session-Time", AttributeValue::Integer(seconds))?;
    }
    client.send(&request).await
}

async fn status(client: &Client, args: &ProbeArgs) -> i32 {
    print_connection(client.config(), client.config().auth_port);

    let start = Instant::now();
    let result = match client.status_request() {
        Ok(request) => client.send(&request).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(reply) => {
            println!(
                "\nServer alive via Status-Server  (code={}, {} ms)",
                reply.code().as_u8(),
                start.elapsed().as_millis()
            );
            return EXIT_OK;
        }
        Err(e) if e.is_no_reply() => {
            debug!(error = %e, "Status-Server failed");
            println!("Status-Server not supported, falling back to auth probe...");
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_FAILURE;
        }
    }

    let start = Instant::now();
    let result = match client.access_request(&args.probe_user, &args.probe_pass) {
        Ok(request) => client.send(&request).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(reply) => {
            let label = if reply.code() == Code::AccessAccept {
                "Accept"
            } else {
                "Reject"
            };
            println!(
                "\nServer alive via auth probe  (Access-{}, {} ms)",
                label,
                start.elapsed().as_millis()
            );
            EXIT_OK
        }
        Err(e) => {
            println!("\nServer unreachable: {}", e);
            EXIT_REJECTED
        }
    }
}

/// 16 lowercase hex digits
fn random_session_id() -> String {
    let bytes: [u8; 8] = rand::random();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
