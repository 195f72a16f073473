use std::{env, error::Error, fs, path::Path};

use serde::Deserialize;

#[derive(Deserialize)]
struct RawConfig {
    wifi_ssid: String,
    wifi_psk: String,
    device_id: String,
    mqtt_hostname: String,
    mqtt_port: u16,
    mqtt_username: String,
    mqtt_password: String,
    mqtt_base_topic: String,
    mqtt_state_prefix: String,
    http_port: u16,
    http_path: String,
    default_status: String,
    default_send_interval_ms: u32,
    default_publish_temperature: bool,
    default_publish_humidity: bool,
    temp_sensor_id: String,
    hum_sensor_id: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    // Tell Cargo to rerun if toml changes
    println!("cargo:rerun-if-changed=cfg.toml");

    // Read and parse
    let toml_str = fs::read_to_string("cfg.toml")?;
    let raw: RawConfig = toml::from_str(&toml_str)?;

    // Generate Rust code
    let out_dir = env::var("OUT_DIR")?;
    let dest_path = Path::new(&out_dir).join("config.rs");
    let code = format!(
        r#"
        pub const CONFIG: Config = Config {{
            wifi_ssid: {ssid:?},
            wifi_psk: {psk:?},
            device_id: {device:?},
            mqtt_hostname: {mh:?},
            mqtt_port: {mp},
            mqtt_username: {mu:?},
            mqtt_password: {mpw:?},
            mqtt_base_topic: {mbt:?},
            mqtt_state_prefix: {msp:?},
            http_port: {hp},
            http_path: {hpath:?},
            default_status: {ds:?},
            default_send_interval_ms: {dsi},
            default_publish_temperature: {dpt},
            default_publish_humidity: {dph},
            temp_sensor_id: {tid:?},
            hum_sensor_id: {hid:?},
        }};
    "#,
        ssid = raw.wifi_ssid,
        psk = raw.wifi_psk,
        device = raw.device_id,
        mh = raw.mqtt_hostname,
        mp = raw.mqtt_port,
        mu = raw.mqtt_username,
        mpw = raw.mqtt_password,
        mbt = raw.mqtt_base_topic,
        msp = raw.mqtt_state_prefix,
        hp = raw.http_port,
        hpath = raw.http_path,
        ds = raw.default_status,
        dsi = raw.default_send_interval_ms,
        dpt = raw.default_publish_temperature,
        dph = raw.default_publish_humidity,
        tid = raw.temp_sensor_id,
        hid = raw.hum_sensor_id,
    );

    fs::write(dest_path, code)?;
    Ok(())
}
