//! Worker threads for rove.
//!
//! Handles directory reads, git queries, previews, deep search, file operations and shell
//! commands on background threads. Workers never see session state: each [WorkerTask]
//! carries everything it needs plus a `request_id`, and each [WorkerResponse] echoes the
//! id and target path back so the session can drop stale results.
//!
//! # Caution:
//! This module is the protocol boundary between the session and the filesystem. Adding or
//! changing variants requires matching changes in the controller's effect runner and the
//! reducer's response handling.

use crate::core::fileops::{self, BatchReport, FileOperation};
use crate::core::find::{FindResult, find};
use crate::core::fm::Entry;
use crate::core::formatter::PreviewContent;
use crate::core::fs::FileSystem;
use crate::core::git::{GitInfo, GitProvider};
use crate::core::proc::{ShellOutput, run_shell};

use crossbeam_channel::{Receiver, Sender, unbounded};

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// Channel endpoints for the dedicated worker threads.
pub struct Workers {
    io_tx: Sender<WorkerTask>,
    git_tx: Sender<WorkerTask>,
    preview_tx: Sender<WorkerTask>,
    find_tx: Sender<WorkerTask>,
    fileop_tx: Sender<WorkerTask>,
    proc_tx: Sender<WorkerTask>,
    response_rx: Receiver<WorkerResponse>,
}

/// Each concern gets its own thread so a slow git query or a long copy never delays a
/// directory listing.
///
/// The preview and find workers drain their queue before working and only process the
/// newest task; the superseded ones would be discarded on arrival anyway.
impl Workers {
    pub fn spawn(fs: Arc<dyn FileSystem>, git: Arc<dyn GitProvider>) -> Self {
        let (io_tx, io_rx) = unbounded::<WorkerTask>();
        let (git_tx, git_rx) = unbounded::<WorkerTask>();
        let (preview_tx, preview_rx) = unbounded::<WorkerTask>();
        let (find_tx, find_rx) = unbounded::<WorkerTask>();
        let (fileop_tx, fileop_rx) = unbounded::<WorkerTask>();
        let (proc_tx, proc_rx) = unbounded::<WorkerTask>();
        let (res_tx, response_rx) = unbounded::<WorkerResponse>();

        start_io_worker(io_rx, res_tx.clone(), Arc::clone(&fs));
        start_git_worker(git_rx, res_tx.clone(), git);
        start_preview_worker(preview_rx, res_tx.clone(), Arc::clone(&fs));
        start_find_worker(find_rx, res_tx.clone());
        start_fileop_worker(fileop_rx, res_tx.clone(), fs);
        start_proc_worker(proc_rx, res_tx);

        Self {
            io_tx,
            git_tx,
            preview_tx,
            find_tx,
            fileop_tx,
            proc_tx,
            response_rx,
        }
    }

    /// Routes a task to the thread that owns its concern.
    pub fn submit(&self, task: WorkerTask) {
        let tx = match task {
            WorkerTask::LoadDirectory { .. } => &self.io_tx,
            WorkerTask::LoadGit { .. } => &self.git_tx,
            WorkerTask::LoadPreview { .. } => &self.preview_tx,
            WorkerTask::FindRecursive { .. } => &self.find_tx,
            WorkerTask::FileOp { .. } => &self.fileop_tx,
            WorkerTask::Shell { .. } => &self.proc_tx,
        };
        if tx.send(task).is_err() {
            tracing::warn!("worker channel closed, task dropped");
        }
    }

    pub fn response_rx(&self) -> &Receiver<WorkerResponse> {
        &self.response_rx
    }
}

/// Tasks sent to the worker threads.
#[derive(Debug)]
pub enum WorkerTask {
    LoadDirectory {
        path: PathBuf,
        show_hidden: bool,
        focus: Option<String>,
        request_id: u64,
    },
    LoadGit {
        path: PathBuf,
        request_id: u64,
    },
    LoadPreview {
        path: PathBuf,
        max_bytes: usize,
        request_id: u64,
    },
    FindRecursive {
        base_dir: PathBuf,
        query: String,
        max_results: usize,
        show_hidden: bool,
        cancel: Arc<AtomicBool>,
        request_id: u64,
    },
    FileOp {
        op: FileOperation,
        request_id: u64,
    },
    Shell {
        command: String,
        cwd: PathBuf,
        request_id: u64,
    },
}

/// Responses sent from the worker threads back to the session.
#[derive(Debug)]
pub enum WorkerResponse {
    DirectoryLoaded {
        path: PathBuf,
        result: io::Result<Vec<Entry>>,
        focus: Option<String>,
        request_id: u64,
    },
    GitLoaded {
        path: PathBuf,
        info: GitInfo,
        request_id: u64,
    },
    PreviewLoaded {
        path: PathBuf,
        result: io::Result<PreviewContent>,
        request_id: u64,
    },
    FindResults {
        base_dir: PathBuf,
        query: String,
        results: Vec<FindResult>,
        request_id: u64,
    },
    OperationComplete {
        report: BatchReport,
        request_id: u64,
    },
    ShellComplete {
        command: String,
        result: io::Result<ShellOutput>,
        request_id: u64,
    },
}

fn start_io_worker(
    task_rx: Receiver<WorkerTask>,
    res_tx: Sender<WorkerResponse>,
    fs: Arc<dyn FileSystem>,
) {
    thread::spawn(move || {
        while let Ok(task) = task_rx.recv() {
            let WorkerTask::LoadDirectory {
                path,
                show_hidden,
                focus,
                request_id,
            } = task
            else {
                continue;
            };
            let result = fs.list_directory(&path, show_hidden);
            let _ = res_tx.send(WorkerResponse::DirectoryLoaded {
                path,
                result,
                focus,
                request_id,
            });
        }
    });
}

fn start_git_worker(
    task_rx: Receiver<WorkerTask>,
    res_tx: Sender<WorkerResponse>,
    git: Arc<dyn GitProvider>,
) {
    thread::spawn(move || {
        while let Ok(task) = task_rx.recv() {
            let WorkerTask::LoadGit { path, request_id } = task else {
                continue;
            };
            let info = git.git_info(&path);
            let _ = res_tx.send(WorkerResponse::GitLoaded {
                path,
                info,
                request_id,
            });
        }
    });
}

fn start_preview_worker(
    task_rx: Receiver<WorkerTask>,
    res_tx: Sender<WorkerResponse>,
    fs: Arc<dyn FileSystem>,
) {
    thread::spawn(move || {
        while let Ok(task) = task_rx.recv() {
            let WorkerTask::LoadPreview {
                mut path,
                mut max_bytes,
                mut request_id,
            } = task
            else {
                continue;
            };

            // Coalesce queued previews, only the latest matters
            while let Ok(next) = task_rx.try_recv() {
                if let WorkerTask::LoadPreview {
                    path: p,
                    max_bytes: m,
                    request_id: id,
                } = next
                {
                    path = p;
                    max_bytes = m;
                    request_id = id;
                }
            }

            let result = fs.read_preview(&path, max_bytes);
            let _ = res_tx.send(WorkerResponse::PreviewLoaded {
                path,
                result,
                request_id,
            });
        }
    });
}

fn start_find_worker(task_rx: Receiver<WorkerTask>, res_tx: Sender<WorkerResponse>) {
    thread::spawn(move || {
        while let Ok(task) = task_rx.recv() {
            let WorkerTask::FindRecursive {
                mut base_dir,
                mut query,
                mut max_results,
                mut show_hidden,
                mut cancel,
                mut request_id,
            } = task
            else {
                continue;
            };

            while let Ok(next) = task_rx.try_recv() {
                if let WorkerTask::FindRecursive {
                    base_dir: b,
                    query: q,
                    max_results: m,
                    show_hidden: h,
                    cancel: c,
                    request_id: id,
                } = next
                {
                    base_dir = b;
                    query = q;
                    max_results = m;
                    show_hidden = h;
                    cancel = c;
                    request_id = id;
                }
            }

            let results = match find(&base_dir, &query, &cancel, max_results, show_hidden) {
                Ok(results) => results,
                Err(e) => {
                    tracing::warn!(base = %base_dir.display(), error = %e, "find failed");
                    Vec::new()
                }
            };

            if cancel.load(Ordering::Acquire) {
                continue;
            }

            let _ = res_tx.send(WorkerResponse::FindResults {
                base_dir,
                query,
                results,
                request_id,
            });
        }
    });
}

/// File operations run strictly one after another in submission order.
fn start_fileop_worker(
    task_rx: Receiver<WorkerTask>,
    res_tx: Sender<WorkerResponse>,
    fs: Arc<dyn FileSystem>,
) {
    thread::spawn(move || {
        while let Ok(task) = task_rx.recv() {
            let WorkerTask::FileOp { op, request_id } = task else {
                continue;
            };
            let report = fileops::execute(fs.as_ref(), op);
            let _ = res_tx.send(WorkerResponse::OperationComplete { report, request_id });
        }
    });
}

fn start_proc_worker(task_rx: Receiver<WorkerTask>, res_tx: Sender<WorkerResponse>) {
    thread::spawn(move || {
        while let Ok(task) = task_rx.recv() {
            let WorkerTask::Shell {
                command,
                cwd,
                request_id,
            } = task
            else {
                continue;
            };
            tracing::debug!(%command, cwd = %cwd.display(), "running shell command");
            let result = run_shell(&command, &cwd);
            let _ = res_tx.send(WorkerResponse::ShellComplete {
                command,
                result,
                request_id,
            });
        }
    });
}
