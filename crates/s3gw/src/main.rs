use s3gw::access::OwnerOnly;
use s3gw::auth::StaticCredentialStore;
use s3gw::config::{AuthConfig, StaticConfigProvider};
use s3gw::context::RequestAuthContext;
use s3gw::service::{GatewayServiceBuilder, S3Handler};
use s3gw::{Body, S3Result};

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

#[derive(Debug, clap::Parser)]
#[command(version, about = "S3 gateway that authenticates requests and echoes the resolved identity")]
struct Opt {
    /// Host to listen on
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value = "8014")]
    port: u16,

    /// Access key of the owner
    #[arg(long)]
    access_key: String,

    /// Secret key of the owner
    #[arg(long)]
    secret_key: String,

    /// Region that credential scopes must name. Empty disables the check.
    #[arg(long, default_value = "us-east-1")]
    region: String,
}

/// Answers every authorized request with the identity the pipeline resolved
struct Echo;

#[async_trait::async_trait]
impl S3Handler for Echo {
    async fn call(&self, req: Request<Body>, cx: RequestAuthContext) -> S3Result<Response<Body>> {
        let target = cx.target();
        let identity = serde_json::json!({
            "method": req.method().as_str(),
            "action": target.action.as_str(),
            "bucket": target.bucket,
            "object": target.object,
            "access_key": cx.credentials().map(|c| c.access_key()),
            "owner": cx.is_owner(),
            "region": cx.region(),
        });

        // Drain the body so that integrity failures are reported
        let (_, body) = req.into_parts();
        let mut stream = body.into_stream();
        let mut received: u64 = 0;
        while let Some(chunk) = futures::StreamExt::next(&mut stream).await {
            let chunk = chunk.map_err(s3gw::S3Error::from_body_error)?;
            received += chunk.len() as u64;
        }
        debug!(received, "request body verified");

        let mut resp = Response::new(Body::from(identity.to_string()));
        resp.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(resp)
    }
}

fn setup_tracing() {
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env();
    let enable_color = std::io::IsTerminal::is_terminal(&std::io::stdout());

    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(env_filter)
        .with_ansi(enable_color)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();
    setup_tracing();

    let service = {
        let mut config = AuthConfig::default();
        config.region.clone_from(&opt.region);

        let store = StaticCredentialStore::from_single(opt.access_key.as_str(), opt.secret_key.as_str())
            .context("invalid credentials")?
            .with_owner(opt.access_key.as_str());

        let mut builder = GatewayServiceBuilder::new(Echo);
        builder.set_config(Arc::new(StaticConfigProvider::new(Arc::new(config))));
        builder.set_store(store);
        builder.set_evaluator(OwnerOnly);
        builder.build()
    };

    let addr = format!("{}:{}", opt.host, opt.port);
    let listener = TcpListener::bind(&addr).await.with_context(|| format!("failed to bind {addr}"))?;
    info!("server is running at http://{addr}");

    let http_server = ConnBuilder::new(TokioExecutor::new());
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();

    let mut ctrl_c = std::pin::pin!(tokio::signal::ctrl_c());

    loop {
        let (socket, remote_addr) = tokio::select! {
            res = listener.accept() => {
                match res {
                    Ok(conn) => conn,
                    Err(err) => {
                        error!("error accepting connection: {err}");
                        continue;
                    }
                }
            }
            _ = ctrl_c.as_mut() => {
                break;
            }
        };

        debug!(%remote_addr, "accepted connection");

        let conn = http_server.serve_connection(TokioIo::new(socket), service.clone());
        let conn = graceful.watch(conn.into_owned());
        tokio::spawn(async move {
            if let Err(err) = conn.await {
                error!(%remote_addr, "error serving connection: {err}");
            }
        });
    }

    tokio::select! {
        () = graceful.shutdown() => {
            info!("gracefully shut down");
        },
        () = tokio::time::sleep(Duration::from_secs(10)) => {
            info!("waited 10 seconds for graceful shutdown, aborting");
        }
    }

    Ok(())
}
