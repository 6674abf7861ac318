//! Application and URL Launcher Tool
//!
//! Opens a local application or a website in the default browser. Known
//! sites get search-template support; anything that looks like a URL or
//! domain is normalized and opened directly.

use async_trait::async_trait;

use valet_core::{
    tool::ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolSchema,
};

/// A site the launcher knows by name
struct KnownSite {
    home: &'static str,
    search: &'static str,
}

fn known_site(name: &str) -> Option<KnownSite> {
    let site = match name {
        "youtube" => KnownSite {
            home: "https://www.youtube.com",
            search: "https://www.youtube.com/results?search_query=",
        },
        "google" => KnownSite {
            home: "https://www.google.com",
            search: "https://www.google.com/search?q=",
        },
        "spotify" => KnownSite {
            home: "https://open.spotify.com",
            search: "https://open.spotify.com/search/",
        },
        "whatsapp" => KnownSite {
            home: "https://web.whatsapp.com/",
            search: "https://web.whatsapp.com/",
        },
        "telegram" => KnownSite {
            home: "https://web.telegram.org/k/",
            search: "https://web.telegram.org/k/",
        },
        "github" => KnownSite {
            home: "https://github.com",
            search: "https://github.com/search?q=",
        },
        "stackoverflow" => KnownSite {
            home: "https://stackoverflow.com",
            search: "https://stackoverflow.com/search?q=",
        },
        _ => return None,
    };
    Some(site)
}

/// What a site request resolves to, separated from the side effect so the
/// URL logic stays testable.
#[derive(Debug, PartialEq, Eq)]
enum SiteAction {
    Open { url: String, report: String },
    Invalid(String),
}

fn resolve_site(target_name: &str, search_query: Option<&str>) -> SiteAction {
    let name = target_name.to_lowercase();

    if let Some(site) = known_site(&name) {
        return match search_query {
            Some(query) if !query.is_empty() => SiteAction::Open {
                url: format!("{}{}", site.search, query.replace(' ', "+")),
                report: format!("SUCCESS: Opened {name} with search query: '{query}'."),
            },
            _ => SiteAction::Open {
                url: site.home.to_string(),
                report: format!("SUCCESS: Opened the main page of {name}."),
            },
        };
    }

    if target_name.starts_with("http") || target_name.contains('.') {
        let url = if target_name.starts_with("http://") || target_name.starts_with("https://") {
            target_name.to_string()
        } else {
            format!("https://{target_name}")
        };

        return match search_query {
            Some(query) if !query.is_empty() => SiteAction::Open {
                url: format!(
                    "https://www.google.com/search?q={}",
                    format!("{url} {query}").replace(' ', "+")
                ),
                report: format!("SUCCESS: Performed Google search for: '{target_name} {query}'."),
            },
            _ => SiteAction::Open {
                report: format!("SUCCESS: Opened URL: '{url}' in the browser."),
                url,
            },
        };
    }

    SiteAction::Invalid(
        "ERROR: Invalid site request. Please specify a known site (youtube, google, spotify) or a full URL/domain.".into(),
    )
}

/// Open a URL with the platform's default opener, detached.
fn open_in_browser(url: &str) -> std::io::Result<()> {
    let mut command = if cfg!(target_os = "macos") {
        let mut c = std::process::Command::new("open");
        c.arg(url);
        c
    } else if cfg!(target_os = "windows") {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", "start", "", url]);
        c
    } else {
        let mut c = std::process::Command::new("xdg-open");
        c.arg(url);
        c
    };

    command.spawn().map(|_| ())
}

/// Tool that opens an application or a URL/search in the browser
pub struct OpenTargetTool;

#[async_trait]
impl Tool for OpenTargetTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "open_application_or_url".into(),
            description: "Open a system application, or a specific URL or search query in the default web browser.".into(),
            parameters: vec![
                ParameterSchema {
                    name: "target_type".into(),
                    param_type: "string".into(),
                    description: "'app' for a local application, 'site' for a website".into(),
                    required: true,
                    enum_values: Some(vec![
                        serde_json::json!("app"),
                        serde_json::json!("site"),
                    ]),
                },
                ParameterSchema::required_string(
                    "target_name",
                    "Application name, known site name, URL or domain",
                ),
                ParameterSchema::optional_string(
                    "search_query",
                    "Search query to run on the target site",
                ),
            ],
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<String> {
        let target_type = call.str_arg("target_type").unwrap_or_default().to_lowercase();
        let target_name = call.str_arg("target_name").unwrap_or_default();
        let search_query = call.str_arg("search_query");

        Ok(match target_type.as_str() {
            "app" => match std::process::Command::new(target_name).spawn() {
                Ok(_) => format!(
                    "SUCCESS: Attempted to open application '{target_name}'. Please check your screen."
                ),
                Err(e) => format!("ERROR: Could not open application '{target_name}'. Reason: {e}"),
            },
            "site" => match resolve_site(target_name, search_query) {
                SiteAction::Open { url, report } => match open_in_browser(&url) {
                    Ok(()) => report,
                    Err(e) => format!("ERROR: Could not open '{url}' in the browser. Reason: {e}"),
                },
                SiteAction::Invalid(report) => report,
            },
            _ => "ERROR: Invalid target_type specified. Use 'app' or 'site'.".into(),
        })
    }
}
