//! Strategy hub seam.
//!
//! The remote computation service that stores and deploys strategies is an
//! external collaborator; only the interface the workbench consumes is
//! defined here. `NullHub` is the no-backend default used by the binary.

use anyhow::Result;

/// Operations the studio needs from a strategy hub.
pub trait StrategyHub: Send {
    /// Push the current strategy text under a name.
    fn submit(&mut self, name: &str, text: &str) -> Result<()>;
    /// Names of strategies known to the hub.
    fn list(&self) -> Result<Vec<String>>;
    /// Put the named strategy on top of the deployment stack.
    fn deploy(&mut self, name: &str) -> Result<()>;
}

/// Hub used when no service is configured: remembers submissions locally so
/// the console's `strategies` listing still works.
#[derive(Default)]
pub struct NullHub {
    names: Vec<String>,
}

impl NullHub {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StrategyHub for NullHub {
    fn submit(&mut self, name: &str, _text: &str) -> Result<()> {
        if !self.names.iter().any(|n| n == name) {
            self.names.push(name.to_string());
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self.names.clone())
    }

    fn deploy(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }
}
