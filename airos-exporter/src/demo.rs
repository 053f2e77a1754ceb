//! Canned status of an access point with two stations.
//!
//! Served by `--demo` so the HTTP surface can be tried without a radio.

use serde_json::json;

use airos_client::StatusDocument;

/// Status document of a demo access point.
pub fn sample_document() -> StatusDocument {
    let mca_status = json!({
        "deviceId": "DE:AD:BE:EF:00:01",
        "deviceName": "demo-ap",
        "apMac": "DE:AD:BE:EF:00:01",
        "wlanOpmode": "ap",
        "wlanTxRate": "300",
        "wlanRxRate": "270",
        "signal": "-58",
        "chanbw": "40",
        "centerFreq": "5745",
        "txPower": "23",
        "chain0Signal": "-60",
        "chain1Signal": "-61",
        "noise": "-95",
        "lanPlugged": "1",
        "ccq": "947",
        "lanRxPackets": "8812734",
        "lanTxPackets": "10244190",
        "wlanRxPackets": "10310441",
        "wlanTxPackets": "8790312",
        "lanRxBytes": "2048813312",
        "lanTxBytes": "9381277442",
        "wlanRxBytes": "9420019283",
        "wlanTxBytes": "2061772001"
    });

    let status = json!({
        "board": {
            "radio": [{ "antenna": [{ "gain": 19 }] }]
        },
        "wireless": {
            "polling": { "quality": 93, "capacity": 78 }
        }
    });

    let stations = vec![
        json!({
            "mac": "DE:AD:BE:EF:10:01",
            "lastip": "10.20.0.11",
            "name": "cpe-north",
            "signal": -62,
            "ccq": 921,
            "rssi": 34,
            "noisefloor": -94,
            "tx_latency": 3,
            "remote": { "hostname": "cpe-north.lan", "tx_power": 21 },
            "airmax": { "quality": 89 }
        }),
        json!({
            "mac": "DE:AD:BE:EF:10:02",
            "lastip": "10.20.0.12",
            "name": "cpe-south",
            "signal": -71,
            "ccq": 784,
            "rssi": 25,
            "noisefloor": -93,
            "tx_latency": 12
        }),
    ];

    let mca_status = match mca_status {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };

    StatusDocument::new(mca_status, status, stations)
}
