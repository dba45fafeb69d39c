use pagetrack_common::error::NavigationError;

/// Receives "current path changed" notifications.
pub trait PathObserver: Send {
    fn on_path_change(&mut self, path: &str);
}

impl<F> PathObserver for F
where
    F: FnMut(&str) + Send,
{
    fn on_path_change(&mut self, path: &str) {
        self(path)
    }
}

/// Minimal stand-in for the host's routing layer.
///
/// Observers are called synchronously, in subscription order, and never
/// re-entrantly since `navigate` takes `&mut self`.
pub struct Router {
    current: String,
    observers: Vec<Box<dyn PathObserver>>,
}

impl Router {
    pub fn new(initial: impl Into<String>) -> Result<Self, NavigationError> {
        let current = initial.into();
        validate(&current)?;
        Ok(Self {
            current,
            observers: Vec::new(),
        })
    }

    pub fn current_path(&self) -> &str {
        &self.current
    }

    /// Register an observer. It is immediately told the current path.
    pub fn subscribe(&mut self, mut observer: Box<dyn PathObserver>) {
        observer.on_path_change(&self.current);
        self.observers.push(observer);
    }

    /// Change the active path. Repeating the current path still notifies.
    pub fn navigate(&mut self, path: &str) -> Result<(), NavigationError> {
        validate(path)?;
        self.current = path.to_string();
        for observer in &mut self.observers {
            observer.on_path_change(path);
        }
        Ok(())
    }
}

fn validate(path: &str) -> Result<(), NavigationError> {
    if path.trim().is_empty() {
        Err(NavigationError::EmptyPath)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<String>>>, Box<dyn PathObserver>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer: Box<dyn PathObserver> =
            Box::new(move |path: &str| sink.lock().unwrap().push(path.to_string()));
        (seen, observer)
    }

    #[test]
    fn subscribe_reports_initial_path() {
        let mut router = Router::new("/").unwrap();
        let (seen, observer) = recorder();
        router.subscribe(observer);
        assert_eq!(*seen.lock().unwrap(), vec!["/".to_string()]);
    }

    #[test]
    fn navigate_notifies_every_change_including_repeats() {
        let mut router = Router::new("/").unwrap();
        let (seen, observer) = recorder();
        router.subscribe(observer);
        router.navigate("/products").unwrap();
        router.navigate("/products").unwrap();
        assert_eq!(router.current_path(), "/products");
        assert_eq!(*seen.lock().unwrap(), vec!["/", "/products", "/products"]);
    }

    #[test]
    fn empty_path_is_rejected() {
        assert_eq!(Router::new("").err(), Some(NavigationError::EmptyPath));

        let mut router = Router::new("/").unwrap();
        let (seen, observer) = recorder();
        router.subscribe(observer);
        assert_eq!(router.navigate("  "), Err(NavigationError::EmptyPath));
        assert_eq!(router.current_path(), "/");
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
