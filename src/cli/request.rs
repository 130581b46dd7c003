//! Raw request command

use reqwest::Method;

use crate::cli::args::GlobalOptions;
use crate::cli::{CommandContext, RequestArgs, read_json_arg};
use crate::client::RequestSpec;
use crate::error::{Error, Result};
use crate::output;

/// Send one request through the authenticated pipeline and print the payload
pub async fn run(opts: &GlobalOptions, args: &RequestArgs) -> Result<()> {
    let ctx = CommandContext::new(opts)?;

    let method = parse_method(&args.method)?;
    let mut spec = RequestSpec::new(method, normalize_path(&args.path)).query(args.query.clone());
    if let Some(ref data) = args.data {
        spec = spec.json(read_json_arg(data)?);
    }

    let response = ctx.client.send(spec).await?;
    log::debug!("Request answered {}", response.status);
    output::print_value(&response.data(), ctx.format)
}

fn parse_method(method: &str) -> Result<Method> {
    match method.to_ascii_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "PATCH" => Ok(Method::PATCH),
        "DELETE" => Ok(Method::DELETE),
        other => Err(Error::Other(format!("Unsupported method: {}", other))),
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}
