pub(super) fn default_name() -> String {
    "Polyglot".to_string()
}
pub(super) fn default_data_dir() -> String {
    "data".to_string()
}
pub(super) fn default_locale_dir() -> String {
    "locales".to_string()
}
pub(super) fn default_lang() -> String {
    "en".to_string()
}
pub(super) fn default_log_level() -> String {
    "info".to_string()
}
pub(super) fn default_shutdown_timeout() -> u64 {
    5
}
pub(super) fn default_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}
pub(super) fn default_gateway_url() -> String {
    "wss://gateway.discord.gg/?v=10&encoding=json".to_string()
}
