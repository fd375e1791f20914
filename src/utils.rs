lazy_static::lazy_static! {
    static ref APP_ID_RE: regex::Regex = regex::Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9._\-]*$").expect("valid app id regex");
}

static VALIDATE_CACHE: once_cell::sync::Lazy<moka::sync::Cache<String, Result<(), String>>> =
    once_cell::sync::Lazy::new(|| {
        moka::sync::Cache::builder()
            .max_capacity(2000)
            .time_to_live(std::time::Duration::from_secs(300))
            .build()
    });

fn validate_app_id_impl(app_id: &str) -> Result<(), String> {
    if !APP_ID_RE.is_match(app_id) {
        return Err(format!(
            "Invalid app id: '{}'. Contains unsafe characters.",
            app_id
        ));
    }
    Ok(())
}

/// Flatpak application ids are reverse-DNS names. Anything else never reaches
/// the `flatpak` CLI. Memoized, since the same ids come back on every keystroke.
pub fn validate_app_id(app_id: &str) -> Result<(), String> {
    if let Some(cached) = VALIDATE_CACHE.get(app_id) {
        return cached;
    }
    let r = validate_app_id_impl(app_id);
    VALIDATE_CACHE.insert(app_id.to_string(), r.clone());
    r
}
