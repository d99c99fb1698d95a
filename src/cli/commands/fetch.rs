//! Fetch command - route one request through the active controller

use super::open_registration;
use crate::cli::args::{DestinationArg, FetchArgs};
use crate::config::Config;
use crate::error::{ShelterError, ShelterResult};
use crate::http::{Destination, Method, Request, Response};
use crate::store::format_bytes;
use crate::ui::{self, UiContext};
use crate::worker::{FetchOutcome, Served};
use tokio::fs;
use tracing::debug;

impl From<DestinationArg> for Destination {
    fn from(arg: DestinationArg) -> Self {
        match arg {
            DestinationArg::Document => Self::Document,
            DestinationArg::Image => Self::Image,
            DestinationArg::Script => Self::Script,
            DestinationArg::Style => Self::Style,
            DestinationArg::Font => Self::Font,
            DestinationArg::Manifest => Self::Manifest,
            DestinationArg::Empty => Self::Empty,
        }
    }
}

/// Build the request described by the arguments
fn build_request(args: &FetchArgs) -> Request {
    let method = Method::from(args.method.clone());
    let destination = args
        .destination
        .map(Destination::from)
        .unwrap_or_else(|| Destination::from_path(&crate::http::url_path(&args.url)));
    Request::new(method, args.url.clone(), destination)
}

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> ShelterResult<()> {
    let ctx = UiContext::detect();
    let registration = open_registration(config, args.offline).await?;
    let controller = registration.controller()?;

    let request = build_request(&args);
    debug!(
        "Routing {} {} ({}) through {}",
        request.method,
        request.url,
        request.destination,
        controller.version()
    );

    match controller.handle_fetch(&request).await? {
        FetchOutcome::Passthrough => {
            ui::step_info(
                &ctx,
                &format!("{} {} is not intercepted", request.method, request.url),
            );
        }
        FetchOutcome::Served(Served { response, source }) => {
            let Response { status, body, .. } = response;
            let size = body.len() as u64;
            ui::step_ok_detail(
                &ctx,
                &format!("{} {} -> {}", request.method, request.url, status),
                &format!("{}, {}", source, format_bytes(size)),
            );

            if let Some(path) = args.output {
                fs::write(&path, body.into_bytes()).await.map_err(|e| {
                    ShelterError::io(format!("writing response to {}", path.display()), e)
                })?;
                ui::remark(&ctx, &format!("Body written to {}", path.display()));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(argv: &[&str]) -> FetchArgs {
        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            fetch: FetchArgs,
        }
        Wrapper::parse_from(std::iter::once("fetch").chain(argv.iter().copied())).fetch
    }

    #[test]
    fn destination_inferred_from_path() {
        let request = build_request(&args(&["/img/hero.webp"]));
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.destination, Destination::Image);
    }

    #[test]
    fn explicit_destination_wins() {
        let request = build_request(&args(&["/hero", "--destination", "image", "-X", "post"]));
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.destination, Destination::Image);
    }
}
