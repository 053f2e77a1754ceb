//! Parsers for airOS status command output.

use serde_json::{Map, Value};

use crate::error::SessionError;

/// Command printing the flat device status listing.
pub const MCA_STATUS: &str = "mca-status";

/// CGI script printing the nested device status.
pub const STATUS_CGI: &str = "/usr/www/status.cgi";

/// Command printing the associated stations.
pub const WSTALIST: &str = "wstalist";

/// Parse `mca-status` output.
///
/// The first line holds comma separated `key=value` pairs (device identity),
/// every following line a single `key=value` pair.
pub fn parse_mca_status(output: &str) -> Result<Map<String, Value>, SessionError> {
    let mut map = Map::new();
    let mut lines = output.lines().map(str::trim).filter(|l| !l.is_empty());

    if let Some(header) = lines.next() {
        for pair in header.split(',') {
            insert_pair(&mut map, pair);
        }
    }

    for line in lines {
        insert_pair(&mut map, line);
    }

    if map.is_empty() {
        return Err(SessionError::parse(MCA_STATUS, "no key=value pairs"));
    }

    Ok(map)
}

fn insert_pair(map: &mut Map<String, Value>, pair: &str) {
    if let Some((key, value)) = pair.split_once('=') {
        let key = key.trim();
        if !key.is_empty() {
            map.insert(key.to_string(), Value::String(value.trim().to_string()));
        }
    }
}

/// Parse `status.cgi` output, skipping any CGI headers before the JSON body.
pub fn parse_status_cgi(output: &str) -> Result<Value, SessionError> {
    let start = output
        .find('{')
        .ok_or_else(|| SessionError::parse(STATUS_CGI, "no JSON object in output"))?;

    serde_json::from_str(&output[start..]).map_err(|e| SessionError::parse(STATUS_CGI, e.to_string()))
}

/// Parse `wstalist` output. Empty output means no stations.
pub fn parse_wstalist(output: &str) -> Result<Vec<Value>, SessionError> {
    let trimmed = output.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(trimmed).map_err(|e| SessionError::parse(WSTALIST, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MCA_OUTPUT: &str = "deviceName=tower-a,deviceId=00:27:22:AA:BB:CC,firmwareVersion=XW.ar934x.v6.3.6,platform=NanoBeam M5\n\
        wlanOpmode=sta\n\
        apMac=00:27:22:11:22:33\n\
        signal=-61\n\
        ccq=850\n\
        wlanTxRate=144.4\n";

    #[test]
    fn test_parse_mca_status() {
        let map = parse_mca_status(MCA_OUTPUT).unwrap();

        assert_eq!(map["deviceName"], json!("tower-a"));
        assert_eq!(map["deviceId"], json!("00:27:22:AA:BB:CC"));
        assert_eq!(map["platform"], json!("NanoBeam M5"));
        assert_eq!(map["wlanOpmode"], json!("sta"));
        assert_eq!(map["ccq"], json!("850"));
        assert_eq!(map["wlanTxRate"], json!("144.4"));
    }

    #[test]
    fn test_parse_mca_status_value_with_equals() {
        let map = parse_mca_status("deviceName=a\nessid=net=1\n").unwrap();
        assert_eq!(map["essid"], json!("net=1"));
    }

    #[test]
    fn test_parse_mca_status_empty() {
        assert!(matches!(
            parse_mca_status("\n\n"),
            Err(SessionError::Parse { .. })
        ));
    }

    #[test]
    fn test_parse_status_cgi_with_headers() {
        let output = "Content-Type: application/json\r\n\r\n{\"board\":{\"radio\":[{\"antenna\":[{\"gain\":16}]}]}}";
        let status = parse_status_cgi(output).unwrap();
        assert_eq!(status["board"]["radio"][0]["antenna"][0]["gain"], json!(16));
    }

    #[test]
    fn test_parse_status_cgi_garbage() {
        assert!(parse_status_cgi("Status: 500").is_err());
        assert!(parse_status_cgi("{ not json").is_err());
    }

    #[test]
    fn test_parse_wstalist() {
        let stations = parse_wstalist(
            r#"[{"mac":"00:27:22:11:22:33","signal":-60,"remote":{"hostname":"ap"}}]"#,
        )
        .unwrap();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0]["remote"]["hostname"], json!("ap"));
    }

    #[test]
    fn test_parse_wstalist_empty() {
        assert!(parse_wstalist("  \n").unwrap().is_empty());
        assert!(parse_wstalist("[]").unwrap().is_empty());
        assert!(parse_wstalist("{}").is_err());
    }
}
