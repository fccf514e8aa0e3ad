//! Scripted stand-ins for the host and for vendor tools.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sysdash::core::system_monitor::{
    CpuMetrics, DiskMetrics, HostMetrics, MemoryMetrics, NetworkCounters, ProcessSample,
};
use sysdash::platform::command::CommandRunner;
use sysdash::{ProbeError, SysdashError};

pub const GIB: u64 = 1024 * 1024 * 1024;

pub const NVIDIA_QUERY_OUTPUT: &str = "45, 2048, 8192, 61\n";

#[derive(Debug, Clone)]
pub struct HostScript {
    /// Consumed one per tick; the last value repeats
    pub cpu: VecDeque<f32>,
    pub last_cpu: f32,
    pub memory_total: u64,
    pub memory_used: u64,
    pub disk_fails: bool,
    pub network_panics: bool,
    pub processes_panic: bool,
    pub counters: NetworkCounters,
    pub processes: Vec<ProcessSample>,
}

impl Default for HostScript {
    fn default() -> Self {
        Self {
            cpu: VecDeque::new(),
            last_cpu: 0.0,
            memory_total: 16 * GIB,
            memory_used: 4 * GIB,
            disk_fails: false,
            network_panics: false,
            processes_panic: false,
            counters: NetworkCounters::default(),
            processes: Vec::new(),
        }
    }
}

/// [`HostMetrics`] driven by a shared script the test can edit between ticks.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHost {
    script: Arc<Mutex<HostScript>>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cpu(values: &[f32]) -> Self {
        let host = Self::new();
        host.edit(|s| s.cpu = values.iter().copied().collect());
        host
    }

    pub fn edit<F: FnOnce(&mut HostScript)>(&self, f: F) {
        f(&mut self.script.lock().unwrap());
    }

    pub fn boxed(&self) -> Box<dyn HostMetrics> {
        Box::new(self.clone())
    }
}

impl HostMetrics for ScriptedHost {
    fn cpu(&mut self) -> sysdash::Result<CpuMetrics> {
        let mut script = self.script.lock().unwrap();
        if let Some(next) = script.cpu.pop_front() {
            script.last_cpu = next;
        }
        Ok(CpuMetrics {
            usage_percent: script.last_cpu,
            frequency_mhz: 3200,
            physical_cores: Some(4),
            logical_cores: 8,
            temperature_celsius: None,
        })
    }

    fn memory(&mut self) -> sysdash::Result<MemoryMetrics> {
        let script = self.script.lock().unwrap();
        Ok(MemoryMetrics::from_totals(
            script.memory_total,
            script.memory_used,
            script.memory_total - script.memory_used,
        ))
    }

    fn disk(&mut self) -> sysdash::Result<DiskMetrics> {
        let script = self.script.lock().unwrap();
        if script.disk_fails {
            return Err(SysdashError::metric_collection("no disk mounted at /"));
        }
        Ok(DiskMetrics::from_space("/", 500 * GIB, 200 * GIB))
    }

    fn network_counters(&mut self) -> sysdash::Result<NetworkCounters> {
        let (panics, counters) = {
            let script = self.script.lock().unwrap();
            (script.network_panics, script.counters)
        };
        if panics {
            panic!("network driver returned garbage");
        }
        Ok(counters)
    }

    fn processes(&mut self) -> sysdash::Result<Vec<ProcessSample>> {
        let (panics, processes) = {
            let script = self.script.lock().unwrap();
            (script.processes_panic, script.processes.clone())
        };
        if panics {
            panic!("process table changed while iterating");
        }
        Ok(processes)
    }
}

/// What a scripted vendor tool does when invoked
#[derive(Debug, Clone)]
pub enum Reply {
    Stdout(String),
    /// Answer after a pause, like a slow driver
    Delayed(Duration, String),
    Exit(i32),
    Missing,
    Timeout,
    SpawnExhausted,
}

struct Rule {
    program: &'static str,
    arg_contains: &'static str,
    reply: Reply,
}

/// [`CommandRunner`] answering from a rule table; anything unscripted is "not installed".
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<(String, Vec<String>, Duration)>>,
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Reply to `program` when one of its arguments contains `arg_contains`.
    /// An empty `arg_contains` matches any call. Later rules win.
    pub fn set(&self, program: &'static str, arg_contains: &'static str, reply: Reply) {
        let mut rules = self.rules.lock().unwrap();
        rules.retain(|r| !(r.program == program && r.arg_contains == arg_contains));
        rules.insert(
            0,
            Rule {
                program,
                arg_contains,
                reply,
            },
        );
    }

    /// A working nvidia-smi reporting [`NVIDIA_QUERY_OUTPUT`] and two compute apps
    pub fn with_nvidia() -> Arc<Self> {
        let runner = Self::new();
        runner.set("nvidia-smi", "", Reply::Stdout("37\n".to_string()));
        runner.set(
            "nvidia-smi",
            "memory.used",
            Reply::Stdout(NVIDIA_QUERY_OUTPUT.to_string()),
        );
        runner.set(
            "nvidia-smi",
            "compute-apps",
            Reply::Stdout("1234\n5678\n".to_string()),
        );
        runner
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>, Duration)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, program: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _, _)| p == program)
            .count()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<String, ProbeError> {
        self.calls.lock().unwrap().push((
            program.to_string(),
            args.iter().map(|a| a.to_string()).collect(),
            timeout,
        ));

        let reply = self
            .rules
            .lock()
            .unwrap()
            .iter()
            .find(|r| {
                r.program == program
                    && (r.arg_contains.is_empty() || args.iter().any(|a| a.contains(r.arg_contains)))
            })
            .map(|r| r.reply.clone())
            .unwrap_or(Reply::Missing);

        match reply {
            Reply::Stdout(out) => Ok(out),
            Reply::Delayed(pause, out) => {
                tokio::time::sleep(pause).await;
                Ok(out)
            }
            Reply::Exit(code) => Err(ProbeError::ExitStatus {
                program: program.to_string(),
                code: Some(code),
            }),
            Reply::Missing => Err(ProbeError::Missing(program.to_string())),
            Reply::Timeout => Err(ProbeError::Timeout {
                program: program.to_string(),
                timeout,
            }),
            Reply::SpawnExhausted => Err(ProbeError::Spawn {
                program: program.to_string(),
                source: io::Error::new(io::ErrorKind::OutOfMemory, "Resource temporarily unavailable"),
            }),
        }
    }
}
