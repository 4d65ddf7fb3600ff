pub const RELOAD_LAST_SEARCH_PARAM: &str = "reloadLastSearch";

/// True when the query string carries `reloadLastSearch`, whatever its value.
pub fn wants_last_used(query: &str) -> bool {
    let query = query.trim();
    let query = query.strip_prefix('?').unwrap_or(query);
    query
        .split('&')
        .map(|pair| pair.split_once('=').map_or(pair, |(key, _)| key))
        .any(|key| key == RELOAD_LAST_SEARCH_PARAM)
}
