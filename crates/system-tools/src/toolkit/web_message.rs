//! Web Messaging Tool
//!
//! Sends a message through WhatsApp Web by driving a real browser over
//! WebDriver. Login persistence comes from a pre-logged-in browser profile
//! configured in a per-app JSON file; the WebDriver endpoint (chromedriver)
//! must already be running at the configured URL.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use serde::Deserialize;

use valet_core::{
    tool::ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolSchema,
};

pub const WHATSAPP_CONFIG_FILE: &str = "whatsapp_config.json";
pub const TELEGRAM_CONFIG_FILE: &str = "telegram_config.json";

/// How long to wait for any one page element before giving up.
const ELEMENT_WAIT: Duration = Duration::from_secs(30);

/// Pause after typing into the search box so the result list settles.
const SEARCH_SETTLE: Duration = Duration::from_secs(2);

/// Per-app automation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WebMessageConfig {
    /// The web client URL to drive
    pub url: String,

    /// Browser profile directory holding the logged-in session
    pub browser_profile_path: String,

    /// Running WebDriver endpoint (chromedriver)
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}

/// Load configuration for a web application by name.
/// Returns `None` when the file is missing, malformed or incomplete.
pub fn load_web_config(app_name: &str) -> Option<WebMessageConfig> {
    let file = match app_name {
        "whatsapp" => WHATSAPP_CONFIG_FILE,
        "telegram" => TELEGRAM_CONFIG_FILE,
        _ => return None,
    };
    load_web_config_from(Path::new(file))
}

pub(crate) fn load_web_config_from(path: &Path) -> Option<WebMessageConfig> {
    let raw = std::fs::read_to_string(path).ok()?;
    let config: WebMessageConfig = serde_json::from_str(&raw).ok()?;
    if config.browser_profile_path.is_empty() {
        return None;
    }
    Some(config)
}

/// Tool that sends a message via WhatsApp Web or Telegram Web
pub struct SendWebMessageTool;

#[async_trait]
impl Tool for SendWebMessageTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "send_web_message".into(),
            description: "Send a message to a contact via WhatsApp Web or Telegram Web using a pre-configured browser profile.".into(),
            parameters: vec![
                ParameterSchema {
                    name: "app_name".into(),
                    param_type: "string".into(),
                    description: "Which messaging app to use".into(),
                    required: true,
                    enum_values: Some(vec![
                        serde_json::json!("whatsapp"),
                        serde_json::json!("telegram"),
                    ]),
                },
                ParameterSchema::required_string("contact_name", "The contact to message"),
                ParameterSchema::required_string("message_content", "The message text to send"),
            ],
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<String> {
        let app_name = call.str_arg("app_name").unwrap_or_default().to_lowercase();
        let contact = call.str_arg("contact_name").unwrap_or_default();
        let message = call.str_arg("message_content").unwrap_or_default();

        if app_name != "whatsapp" && app_name != "telegram" {
            return Ok("ERROR: Unsupported web application for messaging.".into());
        }

        let Some(config) = load_web_config(&app_name) else {
            return Ok(format!(
                "ERROR: Configuration for {app_name} not found or profile path missing. Please create {app_name}_config.json."
            ));
        };

        if app_name == "telegram" {
            return Ok("INFO: Telegram automation is not yet implemented.".into());
        }

        Ok(send_whatsapp(&config, contact, message)
            .await
            .unwrap_or_else(|report| report))
    }
}

/// Run the WhatsApp Web flow end to end. The browser session is always
/// closed, success or not.
async fn send_whatsapp(
    config: &WebMessageConfig,
    contact: &str,
    message: &str,
) -> std::result::Result<String, String> {
    let mut capabilities = serde_json::Map::new();
    capabilities.insert(
        "goog:chromeOptions".into(),
        serde_json::json!({
            "args": [
                format!("--user-data-dir={}", config.browser_profile_path),
                "--headless=new",
            ]
        }),
    );

    let client = ClientBuilder::native()
        .capabilities(capabilities)
        .connect(&config.webdriver_url)
        .await
        .map_err(|e| {
            format!("ERROR: Could not initialize the browser session. Driver/profile error: {e}")
        })?;

    let outcome = drive_whatsapp(&client, &config.url, contact, message).await;
    if let Err(e) = client.close().await {
        tracing::warn!(error = %e, "failed to close browser session");
    }
    outcome
}

async fn drive_whatsapp(
    client: &Client,
    url: &str,
    contact: &str,
    message: &str,
) -> std::result::Result<String, String> {
    let fail = |step: &str, e: fantoccini::error::CmdError| {
        format!("ERROR during automation (whatsapp): failed to {step}. Reason: {e}")
    };

    client.goto(url).await.map_err(|e| fail("open the page", e))?;

    let search_box = wait_for(client, r#"//div[@contenteditable="true"][@data-tab="3"]"#)
        .await
        .map_err(|e| fail("find the search box", e))?;
    search_box
        .send_keys(contact)
        .await
        .map_err(|e| fail("type into the search box", e))?;
    tokio::time::sleep(SEARCH_SETTLE).await;

    let contact_entry = wait_for(client, &format!(r#"//span[@title="{contact}"]"#))
        .await
        .map_err(|e| fail("find the contact", e))?;
    contact_entry
        .click()
        .await
        .map_err(|e| fail("open the chat", e))?;

    let message_area = wait_for(client, r#"//div[@contenteditable="true"][@data-tab="10"]"#)
        .await
        .map_err(|e| fail("find the message area", e))?;
    message_area
        .send_keys(message)
        .await
        .map_err(|e| fail("type the message", e))?;

    let send_button = wait_for(client, r#"//span[@data-icon="send"]"#)
        .await
        .map_err(|e| fail("find the send button", e))?;
    send_button
        .click()
        .await
        .map_err(|e| fail("send the message", e))?;

    Ok(format!("SUCCESS: Message sent to {contact} on whatsapp."))
}

async fn wait_for(
    client: &Client,
    xpath: &str,
) -> std::result::Result<fantoccini::elements::Element, fantoccini::error::CmdError> {
    client
        .wait()
        .at_most(ELEMENT_WAIT)
        .for_element(Locator::XPath(xpath))
        .await
}
