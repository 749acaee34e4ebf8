//! Http command (wait for an endpoint response).

use anyhow::Result;
use clap::Args;
use fleetcheck_poll::PollSpec;
use fleetcheck_probes::http::DEFAULT_REQUEST_TIMEOUT;
use fleetcheck_probes::{EndpointProbe, EndpointResponse};

use super::{BoxPredicate, CommandContext, PollArgs};

/// Http command - GET a URL until the response matches.
#[derive(Debug, Args)]
pub struct HttpCommand {
    #[command(flatten)]
    poll: PollArgs,

    /// URL to request.
    #[arg(long)]
    url: String,

    /// Skip TLS certificate verification.
    #[arg(long, short = 'k')]
    insecure: bool,

    /// Expected HTTP status. Defaults to any 2xx when --contains is absent.
    #[arg(long)]
    status: Option<u16>,

    /// Text the body must contain.
    #[arg(long)]
    contains: Option<String>,
}

impl HttpCommand {
    pub async fn run(self, ctx: CommandContext) -> Result<()> {
        let probe = EndpointProbe::new(&self.url, self.insecure, DEFAULT_REQUEST_TIMEOUT)?;
        let predicate = response_predicate(self.status, self.contains.clone());

        let response = ctx
            .wait_for(
                &self.url,
                self.poll_spec(),
                probe,
                predicate,
            )
            .await?;

        println!("{}", response.body);
        Ok(())
    }
}

impl HttpCommand {
    /// Endpoints share the command default of 2m / 5s.
    fn poll_spec(&self) -> PollSpec {
        self.poll.to_spec(PollSpec::command_ready())
    }
}

fn response_predicate(
    status: Option<u16>,
    contains: Option<String>,
) -> BoxPredicate<EndpointResponse> {
    match (status, contains) {
        (None, None) => Box::new(|r: &EndpointResponse| (200..300).contains(&r.status)),
        (status, needle) => Box::new(move |r: &EndpointResponse| {
            status.map_or(true, |s| r.status == s)
                && needle.as_deref().map_or(true, |n| r.body.contains(n))
        }),
    }
}
