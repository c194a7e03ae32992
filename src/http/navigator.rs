use std::sync::Mutex;

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

/// Where the client currently "is" and how it moves elsewhere.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn navigate(&self, path: &str);
}

/// Navigator that only records the path history.
#[derive(Debug)]
pub struct MemoryNavigator {
    history: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    pub fn new(start: &str) -> Self {
        Self {
            history: Mutex::new(vec![start.to_string()]),
        }
    }

    /// Every path visited after the starting one.
    pub fn visited(&self) -> Vec<String> {
        let history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        history.iter().skip(1).cloned().collect()
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new(HOME_PATH)
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        let history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        history.last().cloned().unwrap_or_else(|| HOME_PATH.to_string())
    }

    fn navigate(&self, path: &str) {
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        history.push(path.to_string());
    }
}
