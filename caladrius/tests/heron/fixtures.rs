use caladrius::cuckoo::CuckooContext;
use caladrius::settings::CuckooSettings;
use claims::*;
use serde_json::json;
use wiremock::MockServer;

pub const TOPOLOGY: &str = "topoA";

pub fn settings_for(server: &MockServer) -> CuckooSettings {
    CuckooSettings {
        client_name: "caladrius-it".to_string(),
        server_url: format!("{}/", server.uri()),
        ..CuckooSettings::default()
    }
}

pub fn context_for(server: &MockServer) -> CuckooContext {
    assert_ok!(CuckooContext::from_settings(&settings_for(server)))
}

pub fn entry(source: &str, metric: &str, data: serde_json::Value) -> serde_json::Value {
    json!({
        "source": { "sources": [source], "metrics": [metric] },
        "data": data,
    })
}

pub fn success(timeseries: Vec<serde_json::Value>) -> serde_json::Value {
    json!({ "status": "Success", "timeseries": timeseries })
}

pub fn stmgr_entry(metric: &str) -> serde_json::Value {
    entry(
        &format!("{TOPOLOGY}/__stmgr__/container_1___stmgr___1"),
        metric,
        json!([[1530000000, 99.0]]),
    )
}
