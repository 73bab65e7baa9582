//! Fetch command - route one request through the active version

use super::Workspace;
use crate::cli::args::FetchArgs;
use crate::config::Config;
use crate::error::{SwcacheError, SwcacheResult};
use crate::http::{Destination, Request, RequestMode, Response};
use crate::network::{FetchOptions, Fetcher};
use crate::routing::Router;
use std::io::Write;
use tracing::{info, warn};

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> SwcacheResult<()> {
    let request = build_request(&args)?;
    let workspace = Workspace::new(config);
    let registration = workspace.registration().await?;

    let response = match registration.active {
        Some(version) => {
            let router = Router::new(
                version.store_names(),
                workspace.storage.clone(),
                workspace.fetcher.clone(),
            );
            let routed = router.dispatch(&request).await?;
            info!(
                version = %version,
                category = %routed.category,
                source = %routed.source,
                status = routed.response.status,
                "{}",
                request.key()
            );
            routed.into_response()
        }
        None => {
            warn!("no active version, request goes straight to the network");
            workspace
                .fetcher
                .fetch(&request, FetchOptions::default())
                .await?
        }
    };

    write_response(&response, args.include)
}

fn build_request(args: &FetchArgs) -> SwcacheResult<Request> {
    let mut request = Request::new(&args.method, &args.url)?;
    if args.navigate {
        request = request.with_mode(RequestMode::Navigate);
    }
    if let Some(ref accept) = args.accept {
        request = request.with_accept(accept.as_str());
    }
    if let Some(ref destination) = args.destination {
        request = request.with_destination(destination.parse::<Destination>()?);
    }
    for (name, value) in &args.headers {
        request = request.with_header(name, value.as_str());
    }
    Ok(request)
}

/// Write the body to stdout, preceded by the head when `include` is set
fn write_response(response: &Response, include: bool) -> SwcacheResult<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let write = |out: &mut std::io::StdoutLock<'_>| -> std::io::Result<()> {
        if include {
            writeln!(out, "HTTP {} {}", response.status, response.status_text)?;
            for (name, value) in response.headers.iter() {
                writeln!(out, "{}: {}", name, value)?;
            }
            writeln!(out)?;
        }
        out.write_all(&response.body)?;
        out.flush()
    };
    write(&mut out).map_err(|e| SwcacheError::io("writing response to stdout", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{classify, Category};

    fn args(url: &str) -> FetchArgs {
        FetchArgs {
            url: url.to_string(),
            method: "GET".to_string(),
            navigate: false,
            accept: None,
            destination: None,
            headers: Vec::new(),
            include: false,
        }
    }

    #[test]
    fn navigate_flag_builds_html_request() {
        let mut a = args("https://scanner.example/");
        a.navigate = true;
        let request = build_request(&a).unwrap();
        assert_eq!(request.mode(), RequestMode::Navigate);
        assert_eq!(classify(&request), Category::HtmlNavigation);
    }

    #[test]
    fn accept_and_destination_are_applied() {
        let mut a = args("https://scanner.example/photo");
        a.accept = Some("text/html".to_string());
        a.destination = Some("image".to_string());
        a.headers = vec![("X-Debug".to_string(), "1".to_string())];
        let request = build_request(&a).unwrap();
        assert_eq!(request.accept(), Some("text/html"));
        assert_eq!(request.destination(), &Destination::Image);
        assert_eq!(request.headers().get("x-debug"), Some("1"));
    }

    #[test]
    fn method_is_normalized() {
        let mut a = args("https://scanner.example/api");
        a.method = "post".to_string();
        let request = build_request(&a).unwrap();
        assert_eq!(request.method(), "POST");
        assert!(!request.is_cacheable());
    }

    #[test]
    fn relative_url_is_rejected() {
        let err = build_request(&args("/scannerlogo.png")).unwrap_err();
        assert!(matches!(err, SwcacheError::UrlInvalid { .. }));
    }
}
