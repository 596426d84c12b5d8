//! MIME type inference for synthesized attachments.

/// Infer a MIME type from a file path's extension.
///
/// Unknown and missing extensions fall back to `text/plain`, which matches
/// the attachment default.
pub fn infer(path: &str) -> &'static str {
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "py" => "text/x-python",
        "rs" => "text/x-rust",
        "js" => "application/javascript",
        "ts" => "application/typescript",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "json" => "application/json",
        "yaml" | "yml" => "application/x-yaml",
        "toml" => "application/toml",
        "xml" => "application/xml",
        "md" => "text/markdown",
        "sh" => "application/x-sh",
        "bat" | "cmd" => "application/x-bat",
        "ps1" => "application/x-powershell",
        "sql" => "application/sql",
        "csv" => "text/csv",
        _ => "text/plain",
    }
}
