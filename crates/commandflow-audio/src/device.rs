use commandflow_foundation::AudioError;
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host, SupportedStreamConfigRange};

pub struct DeviceManager {
    host: Host,
    current_device: Option<Device>,
}

#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub is_default: bool,
    pub supported_configs: Vec<String>,
}

impl DeviceManager {
    pub fn new() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        Ok(Self {
            host,
            current_device: None,
        })
    }

    pub fn host_id(&self) -> cpal::HostId {
        self.host.id()
    }

    pub fn enumerate_devices(&self) -> Vec<DeviceInfo> {
        let mut devices = Vec::new();

        if let Ok(inputs) = self.host.input_devices() {
            for device in inputs {
                if let Ok(name) = device.name() {
                    let configs = self.get_supported_configs(&device);
                    if !configs.is_empty() {
                        devices.push(DeviceInfo {
                            name,
                            is_default: false,
                            supported_configs: configs,
                        });
                    }
                }
            }
        }

        if let Some(default) = self.host.default_input_device() {
            if let Ok(default_name) = default.name() {
                for device in &mut devices {
                    if device.name == default_name {
                        device.is_default = true;
                    }
                }
            }
        }

        devices
    }

    pub fn default_input_device_name(&self) -> Option<String> {
        self.host.default_input_device().and_then(|d| d.name().ok())
    }

    /// Candidate device names in priority order: ALSA "default" shim, then
    /// "pipewire", then the host default, then everything else.
    pub fn candidate_device_names(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let all = self.enumerate_devices();

        if all.iter().any(|d| d.name == "default") {
            out.push("default".to_string());
        }

        if all.iter().any(|d| d.name == "pipewire") && !out.iter().any(|n| n == "pipewire") {
            out.push("pipewire".to_string());
        }

        if let Some(def) = self.default_input_device_name() {
            if !out.iter().any(|n| n == &def) {
                out.push(def);
            }
        }

        for d in all {
            if !out.iter().any(|n| n == &d.name) {
                out.push(d.name);
            }
        }

        out
    }

    pub fn open_device(&mut self, name: Option<&str>) -> Result<Device, AudioError> {
        if let Some(preferred) = name {
            if let Some(device) = self.find_device_by_name(preferred) {
                self.current_device = Some(device.clone());
                return Ok(device);
            }
            // Closest case-insensitive substring match before giving up.
            if let Some(device) = self
                .find_device_by_predicate(|n| n.to_lowercase().contains(&preferred.to_lowercase()))
            {
                tracing::warn!(
                    "Preferred device '{}' not found exactly; using closest match '{}'",
                    preferred,
                    device.name().unwrap_or_default()
                );
                self.current_device = Some(device.clone());
                return Ok(device);
            }
            // A specific name was requested; do not silently fall back.
            return Err(AudioError::DeviceNotFound {
                name: Some(preferred.to_string()),
            });
        }

        let device = self
            .host
            .default_input_device()
            .ok_or(AudioError::DeviceNotFound { name: None })?;
        self.current_device = Some(device.clone());
        Ok(device)
    }

    fn find_device_by_name(&self, name: &str) -> Option<Device> {
        self.find_device_by_predicate(|n| n == name)
    }

    fn find_device_by_predicate<F: Fn(&str) -> bool>(&self, pred: F) -> Option<Device> {
        let inputs = self.host.input_devices().ok()?;
        for device in inputs {
            if let Ok(name) = device.name() {
                if pred(&name) {
                    return Some(device);
                }
            }
        }
        None
    }

    fn get_supported_configs(&self, device: &Device) -> Vec<String> {
        match device.supported_input_configs() {
            Ok(configs) => configs.map(|c| describe_config(&c)).collect(),
            Err(_) => Vec::new(),
        }
    }
}

fn describe_config(config: &SupportedStreamConfigRange) -> String {
    format!(
        "{} ch, {}-{} Hz, {:?}",
        config.channels(),
        config.min_sample_rate().0,
        config.max_sample_rate().0,
        config.sample_format()
    )
}
