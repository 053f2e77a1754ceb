//! Mapping from an airOS status document to metric scopes.
//!
//! Device metrics read from `mca-status` use strict lookups: a missing key
//! fails the poll. Nested values (antenna gain, airMax polling) and the
//! station list are read defensively with defaults. Station metrics never
//! fail; optional station values are omitted when absent or zero.

use airos_common::{FieldError, Station, StatusDocument};

use crate::scope::{LabelSet, MetricScope};

/// Poll health indicator: 0 on success, 1 on failure.
pub const ERROR_METRIC: &str = "airos_error";
pub const ERROR_HELP: &str = "Whether polling the device failed";

/// Device gauges read strictly from `mca-status`: (metric, help, key).
const RADIO_GAUGES: &[(&str, &str, &str)] = &[
    ("airos_wlan_tx_rate_mbps", "Radio TX rate", "wlanTxRate"),
    ("airos_wlan_rx_rate_mbps", "Radio RX rate", "wlanRxRate"),
    ("airos_signal_dbm", "Signal", "signal"),
    ("airos_chanbw_mhz", "Channel Width", "chanbw"),
    ("airos_center_freq_mhz", "Frequency", "centerFreq"),
    ("airos_tx_power_dbm", "TX Power", "txPower"),
    ("airos_chain_0_signal_dbm", "Chan 0 Signal", "chain0Signal"),
    ("airos_chain_1_signal_dbm", "Chan 1 Signal", "chain1Signal"),
    ("airos_noise_dbm", "Noise Floor", "noise"),
    ("airos_lan_plugged", "LAN plugged", "lanPlugged"),
];

/// Device counters read strictly from `mca-status`: (metric, help, key).
const TRAFFIC_COUNTERS: &[(&str, &str, &str)] = &[
    ("airos_lan_rx_packets_total", "LAN RX packets", "lanRxPackets"),
    ("airos_lan_tx_packets_total", "LAN TX packets", "lanTxPackets"),
    ("airos_wlan_rx_packets_total", "WLAN RX packets", "wlanRxPackets"),
    ("airos_wlan_tx_packets_total", "WLAN TX packets", "wlanTxPackets"),
    ("airos_lan_rx_bytes_total", "LAN RX bytes", "lanRxBytes"),
    ("airos_lan_tx_bytes_total", "LAN TX bytes", "lanTxBytes"),
    ("airos_wlan_rx_bytes_total", "WLAN RX bytes", "wlanRxBytes"),
    ("airos_wlan_tx_bytes_total", "WLAN TX bytes", "wlanTxBytes"),
];

const ANTENNA_GAIN: &str = "/board/radio/0/antenna/0/gain";
const AIRMAX_QUALITY: &str = "/wireless/polling/quality";
const AIRMAX_CAPACITY: &str = "/wireless/polling/capacity";

/// Labels identifying the polled device.
pub fn device_labels(doc: &StatusDocument) -> LabelSet {
    LabelSet::new()
        .with("device_id", doc.text_or("deviceId", ""))
        .with("device_name", doc.text_or("deviceName", ""))
        .with("ap_mac", doc.text_or("apMac", ""))
        .with("wireless_mode", doc.text_or("wlanOpmode", ""))
}

/// Build the device scope.
pub fn map_device(doc: &StatusDocument, labels: &LabelSet) -> Result<MetricScope, FieldError> {
    let mut scope = MetricScope::new(labels.clone());

    for (name, help, key) in RADIO_GAUGES {
        scope.gauge(name, help, doc.must_number(key)?);
    }

    scope.gauge(
        "airos_antenna_gain_dbm",
        "Antenna Gain, dBi",
        doc.status_number_or(ANTENNA_GAIN, 0.0),
    );
    scope.gauge("airos_ccq_percent", "CCQ", doc.must_number("ccq")? / 10.0);
    scope.gauge(
        "airos_airmax_quality_percent",
        "airMax Quality",
        doc.status_number_or(AIRMAX_QUALITY, 0.0),
    );
    scope.gauge(
        "airos_airmax_capacity_percent",
        "airMax Capacity",
        doc.status_number_or(AIRMAX_CAPACITY, 0.0),
    );

    scope.gauge(
        "airos_remote_devices",
        "Remote Devices",
        doc.station_count() as f64,
    );
    scope.gauge(
        "airos_remote_devices_extra_reporting",
        "Remote Devices with Extra Reporting",
        doc.stations().filter(Station::has_remote).count() as f64,
    );

    for (name, help, key) in TRAFFIC_COUNTERS {
        scope.counter(name, help, doc.must_counter(key)? as f64);
    }

    Ok(scope)
}

/// Labels identifying a remote station, on top of the device labels.
pub fn remote_labels(station: &Station<'_>, device_labels: &LabelSet) -> LabelSet {
    device_labels
        .clone()
        .with("remote_mac", station.mac())
        .with("remote_lastip", station.last_ip())
        .with("remote_hostname", station.hostname())
}

/// Build the scope for one remote station.
pub fn map_remote(station: Station<'_>, device_labels: &LabelSet) -> MetricScope {
    let mut scope = MetricScope::new(remote_labels(&station, device_labels));

    scope.gauge(
        "airos_remote_signal_dbm",
        "Remote Signal",
        station.number_or("/signal", 0.0),
    );
    scope.gauge(
        "airos_remote_ccq_percent",
        "Remote CCQ",
        station.number_or("/ccq", 0.0) / 10.0,
    );
    scope.gauge(
        "airos_remote_rssi",
        "Remote RSSI",
        station.number_or("/rssi", 0.0),
    );
    scope.gauge(
        "airos_remote_noise_floor_dbm",
        "Remote Noise Floor",
        station.number_or("/noisefloor", 0.0),
    );
    scope.gauge(
        "airos_remote_tx_latency_seconds",
        "Remote TX Latency",
        station.number_or("/tx_latency", 0.0) / 1000.0,
    );

    if let Some(power) = station.number("/remote/tx_power").filter(|v| *v != 0.0) {
        scope.gauge("airos_remote_tx_power_dbm", "Remote TX Power", power);
    }
    if let Some(quality) = station.number("/airmax/quality").filter(|v| *v != 0.0) {
        scope.gauge(
            "airos_remote_airmax_quality_percent",
            "Remote airMax Quality",
            quality,
        );
    }

    scope
}

/// Scope reporting a failed poll, labeled only with the failure text.
pub fn error_scope(error: &str) -> MetricScope {
    let mut scope = MetricScope::new(LabelSet::new().with("error", error));
    scope.gauge(ERROR_METRIC, ERROR_HELP, 1.0);
    scope
}
