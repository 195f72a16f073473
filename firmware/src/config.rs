pub struct Config {
    // Wi-Fi SSID to connect to
    pub wifi_ssid: &'static str,

    // Wi-Fi pre-shared key (password)
    pub wifi_psk: &'static str,

    // Device ID (DHCP hostname and MQTT client id)
    pub device_id: &'static str,

    // MQTT broker hostname or IP address
    pub mqtt_hostname: &'static str,

    // MQTT port (usually 1883)
    pub mqtt_port: u16,

    // MQTT username for authentication (empty if unused)
    pub mqtt_username: &'static str,

    // MQTT password for authentication (empty if unused)
    pub mqtt_password: &'static str,

    // Base topic for the status and command channels
    pub mqtt_base_topic: &'static str,

    // Prefix for the temperature/humidity state channels
    pub mqtt_state_prefix: &'static str,

    // TCP port of the configuration HTTP endpoint
    pub http_port: u16,

    // Path of the configuration HTTP endpoint
    pub http_path: &'static str,

    // Default device status string
    pub default_status: &'static str,

    // Default interval between sensor publications (floored to 1000ms)
    pub default_send_interval_ms: u32,

    // Whether temperature readings are published by default
    pub default_publish_temperature: bool,

    // Whether humidity readings are published by default
    pub default_publish_humidity: bool,

    // Sensor ID embedded in temperature records
    pub temp_sensor_id: &'static str,

    // Sensor ID embedded in humidity records
    pub hum_sensor_id: &'static str,
}

// config values are generated at compile time
include!(concat!(env!("OUT_DIR"), "/config.rs"));
