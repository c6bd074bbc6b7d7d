//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements          | Connects to                  |
//! |-------------|---------------------|------------------------------|
//! | `hardware`  | SensorPort          | DHT22, MH-Z19, BH1750        |
//! |             | ActuatorPort        | Relay GPIOs                  |
//! | `api`       | AuditSink           | Remote REST API              |
//! |             | TelemetrySink       |                              |
//! |             | CommandSource       |                              |
//! |             | RemoteConfigPort    |                              |
//! | `http`      | HttpTransport       | ESP-IDF HTTP client          |
//! | `local_web` | (inbox producer)    | ESP-IDF HTTP server          |
//! | `log_sink`  | EventSink           | Serial log output            |
//! | `nvs`       | ConfigPort          | NVS / in-memory store        |
//! | `time`      | -                   | ESP32 system timer, SNTP     |
//! | `wifi`      | -                   | ESP-IDF WiFi STA             |

pub mod api;
pub mod hardware;
pub mod http;
pub mod local_web;
pub mod log_sink;
pub mod nvs;
pub mod time;
pub mod wifi;
