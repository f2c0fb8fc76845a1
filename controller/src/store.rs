use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use gate_common::SchedulePolicy;

// One JSON file holding the schedule policy. A missing file is the factory
// state, not an error; malformed content surfaces as Err for the caller to
// log and replace with defaults.
#[derive(Clone)]
pub struct PolicyStore {
    path: Arc<PathBuf>,
    lock: Arc<Mutex<()>>,
}

impl PolicyStore {
    pub fn new() -> Self {
        let path = std::env::var("GATE_SETTINGS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./gate_schedule.json"));
        Self::at(path)
    }

    pub fn at(path: PathBuf) -> Self {
        Self {
            path: Arc::new(path),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn load_policy(&self) -> anyhow::Result<SchedulePolicy> {
        let _guard = self.lock.lock().await;
        match tokio::fs::read(self.path.as_ref()).await {
            Ok(raw) => Ok(serde_json::from_slice::<SchedulePolicy>(&raw)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(SchedulePolicy::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn save_policy(&self, policy: &SchedulePolicy) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        let path = self.path.as_ref().clone();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let payload = serde_json::to_vec_pretty(policy)?;
        tokio::fs::write(path, payload).await?;
        Ok(())
    }
}
