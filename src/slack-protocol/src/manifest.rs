//! App manifest document.
//!
//! Only the parts the CLI reads or rewrites are typed. Everything else
//! (functions, workflows, datastores, custom types, unknown keys) is carried
//! as raw JSON so a manifest survives a read and write unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Suffix added to names of apps installed for local development.
pub const LOCAL_RUN_NAME_TAG: &str = "(local)";

/// Where an app's functions execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionRuntime {
    /// Hosted by Slack.
    Slack,
    /// Hosted by the developer.
    Remote,
    /// Running on the developer's machine over Socket Mode.
    Local,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppManifest {
    #[serde(rename = "_metadata", default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub display_information: DisplayInformation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Features>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_config: Option<OAuthConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing_domains: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayInformation {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Features {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_user: Option<BotUser>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BotUser {
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub always_online: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OAuthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Scopes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_management_enabled: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scopes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_runtime: Option<FunctionRuntime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_mode_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_deploy_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_rotation_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactivity: Option<Interactivity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_subscriptions: Option<EventSubscriptions>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interactivity {
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_menu_options_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSubscriptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_events: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_events: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AppManifest {
    pub fn function_runtime(&self) -> Option<FunctionRuntime> {
        self.settings.as_ref().and_then(|s| s.function_runtime)
    }

    /// True for apps whose functions run on Slack's infrastructure.
    pub fn is_hosted(&self) -> bool {
        self.function_runtime() == Some(FunctionRuntime::Slack)
    }

    pub fn bot_scopes(&self) -> Vec<String> {
        self.oauth_config
            .as_ref()
            .and_then(|o| o.scopes.as_ref())
            .and_then(|s| s.bot.clone())
            .unwrap_or_default()
    }

    pub fn outgoing_domains(&self) -> Vec<String> {
        self.outgoing_domains.clone().unwrap_or_default()
    }

    /// The manifest used for a local-run install.
    ///
    /// Names get the `(local)` tag. Hosted apps are switched to the local
    /// runtime over Socket Mode with interactivity on and no request URLs.
    /// `self` is left untouched.
    pub fn derive_local_run(&self) -> AppManifest {
        let mut manifest = self.clone();
        manifest.display_information.name =
            local_run_display_name(&manifest.display_information.name);
        if let Some(bot_user) = manifest
            .features
            .as_mut()
            .and_then(|f| f.bot_user.as_mut())
        {
            bot_user.display_name = local_run_display_name(&bot_user.display_name);
        }

        if self.is_hosted() {
            let settings = manifest.settings.get_or_insert_with(Settings::default);
            settings.function_runtime = Some(FunctionRuntime::Local);
            settings.socket_mode_enabled = Some(true);
            let interactivity = settings
                .interactivity
                .get_or_insert_with(Interactivity::default);
            interactivity.is_enabled = true;
            interactivity.request_url = Some(String::new());
            interactivity.message_menu_options_url = Some(String::new());
            settings
                .event_subscriptions
                .get_or_insert_with(EventSubscriptions::default)
                .request_url = Some(String::new());
        }
        manifest
    }

    /// The manifest used for a deployed install of a hosted app, pointing
    /// interactivity and events at the API `host`. Other apps are returned
    /// as they are.
    pub fn with_hosted_settings(&self, host: &str) -> AppManifest {
        let mut manifest = self.clone();
        if !self.is_hosted() {
            return manifest;
        }
        let settings = manifest.settings.get_or_insert_with(Settings::default);
        let interactivity = settings
            .interactivity
            .get_or_insert_with(Interactivity::default);
        interactivity.is_enabled = true;
        interactivity.request_url = Some(host.to_string());
        interactivity.message_menu_options_url = Some(host.to_string());
        settings
            .event_subscriptions
            .get_or_insert_with(EventSubscriptions::default)
            .request_url = Some(host.to_string());
        manifest
    }
}

pub fn local_run_display_name(name: &str) -> String {
    format!("{name} {LOCAL_RUN_NAME_TAG}")
}
