//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`]: the whole [`SystemConfig`] is stored as one
//! postcard blob under `kozatakip/syscfg`.
//!
//! - Validation: every field is range-checked before persistence, and a
//!   stored blob that no longer validates is reported, not used.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//! - Host builds keep blobs in an in-memory map (dev/test only).

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SystemConfig;
use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const CONFIG_NAMESPACE: &str = "kozatakip";
const CONFIG_KEY: &str = "syscfg";

/// NVS keys and namespaces are at most 15 bytes plus NUL.
#[cfg(target_os = "espidf")]
fn nul_terminated(s: &str) -> [u8; 16] {
    let mut buf = [0u8; 16];
    let len = s.len().min(15);
    buf[..len].copy_from_slice(&s.as_bytes()[..len]);
    buf
}

/// Largest blob NVS accepts in a single entry on this partition layout.
const MAX_BLOB_SIZE: usize = 4000;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// Returns `Err(ConfigError::IoError)` if flash initialisation fails
    /// unrecoverably.  On first boot or after a version mismatch the NVS
    /// partition is erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                let ret2 = unsafe { nvs_flash_erase() };
                if ret2 != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                let ret3 = unsafe { nvs_flash_init() };
                if ret3 != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// Overwrite the raw stored blob (host simulation of flash corruption).
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_write_raw(&self, bytes: &[u8]) {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        self.store.borrow_mut().insert(key, bytes.to_vec());
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns_buf = nul_terminated(namespace);

        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        // SAFETY: ns_buf is NUL-terminated and outlives the call.
        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    /// Stored blob, `Ok(None)` when the key does not exist yet.
    #[cfg(target_os = "espidf")]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        let result = Self::with_nvs_handle(CONFIG_NAMESPACE, false, |handle| {
            let key_cstr = nul_terminated(CONFIG_KEY);
            let mut size: usize = 0;
            // SAFETY: a null out-buffer asks NVS for the blob length only.
            let ret = unsafe {
                nvs_get_blob(handle, key_cstr.as_ptr() as *const _, core::ptr::null_mut(), &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let mut buf = vec![0u8; size.min(MAX_BLOB_SIZE)];
            let mut size = buf.len();
            // SAFETY: buf is sized to `size` bytes and exclusively borrowed.
            let ret = unsafe {
                nvs_get_blob(handle, key_cstr.as_ptr() as *const _, buf.as_mut_ptr() as *mut _, &mut size)
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            buf.truncate(size);
            Ok(buf)
        });

        match result {
            Ok(bytes) => Ok(Some(bytes)),
            // The namespace does not exist until the first save.
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Ok(None),
            Err(e) => {
                warn!("NvsAdapter: NVS read error {}", e);
                Err(ConfigError::IoError)
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        Ok(self.store.borrow().get(&key).cloned())
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&self, bytes: &[u8]) -> Result<(), ConfigError> {
        let result = Self::with_nvs_handle(CONFIG_NAMESPACE, true, |handle| {
            let key_cstr = nul_terminated(CONFIG_KEY);
            // SAFETY: bytes outlives the call; NVS copies the data.
            let ret = unsafe {
                nvs_set_blob(handle, key_cstr.as_ptr() as *const _, bytes.as_ptr() as *const _, bytes.len())
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        });
        result.map_err(|e| {
            warn!("NvsAdapter: NVS write error {}", e);
            ConfigError::IoError
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&self, bytes: &[u8]) -> Result<(), ConfigError> {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        self.store.borrow_mut().insert(key, bytes.to_vec());
        Ok(())
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let Some(bytes) = self.read_blob()? else {
            info!("NvsAdapter: no stored config, using defaults");
            return Ok(SystemConfig::default());
        };
        let cfg: SystemConfig = postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        info!("NvsAdapter: loaded config ({} bytes)", bytes.len());
        Ok(cfg)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        if bytes.len() > MAX_BLOB_SIZE {
            return Err(ConfigError::IoError);
        }
        self.write_blob(&bytes)?;
        info!("NvsAdapter: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_loads_defaults() {
        let nvs = NvsAdapter::new().unwrap();
        assert_eq!(nvs.load().unwrap(), SystemConfig::default());
    }

    #[test]
    fn save_then_load() {
        let nvs = NvsAdapter::new().unwrap();
        let mut cfg = SystemConfig::default();
        cfg.telemetry_interval_ms = 15_000;
        cfg.relay_active_low = false;
        nvs.save(&cfg).unwrap();
        assert_eq!(nvs.load().unwrap(), cfg);
    }

    #[test]
    fn save_rejects_invalid_config() {
        let nvs = NvsAdapter::new().unwrap();
        let mut cfg = SystemConfig::default();
        cfg.fallback.temperature_min_c = 30.0;
        cfg.fallback.temperature_max_c = 20.0;
        assert!(matches!(nvs.save(&cfg), Err(ConfigError::ValidationFailed(_))));
        assert_eq!(nvs.load().unwrap(), SystemConfig::default());
    }

    #[test]
    fn corrupted_blob_is_reported() {
        let nvs = NvsAdapter::new().unwrap();
        nvs.sim_write_raw(&[0xFF; 3]);
        assert_eq!(nvs.load(), Err(ConfigError::Corrupted));
    }
}
