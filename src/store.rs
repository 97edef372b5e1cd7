use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use log::{error, info};

use crate::models::Employee;

/// Append-only JSON-lines store for assembled employee records: the
/// file-backed stand-in for the external record-store collaborator.
pub struct EmployeeStore {
    path: PathBuf,
}

impl EmployeeStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        EmployeeStore { path: path.into() }
    }

    /// Appends one record. Returns whether the write went through.
    pub fn append(&self, employee: &Employee) -> bool {
        let line = match serde_json::to_string(employee) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize employee record: {}", e);
                return false;
            }
        };

        let mut file = match OpenOptions::new().create(true).append(true).open(&self.path) {
            Ok(file) => file,
            Err(e) => {
                error!("Failed to open employee store for writing: {}", e);
                return false;
            }
        };

        if let Err(e) = writeln!(file, "{}", line) {
            error!("Failed to write employee record: {}", e);
            return false;
        }
        true
    }

    /// Reads every stored record, skipping lines that no longer parse.
    pub fn load_all(&self) -> Vec<Employee> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(_) => {
                info!("No employee store at {:?}. Starting fresh.", self.path);
                return Vec::new();
            }
        };

        let mut employees = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    error!("Failed to read employee store: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(employee) => employees.push(employee),
                Err(e) => error!("Skipping unreadable employee record: {}", e),
            }
        }
        employees
    }
}
