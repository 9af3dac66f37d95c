use crate::error::{LaunchError, Result};
use crate::mcargument::{LaunchCommand, Launcher};
use log::{debug, error, info};
use std::{io, panic, process::Stdio, thread};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Command,
    runtime::{Builder, Handle},
};

/// Receives the game's output, one line at a time.
pub trait OutputSink {
    fn stdout_line(&self, line: &str);
    fn stderr_line(&self, line: &str);
}

/// Forwards stdout to `info` and stderr to `error`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl OutputSink for LogSink {
    fn stdout_line(&self, line: &str) {
        info!("{line}");
    }

    fn stderr_line(&self, line: &str) {
        error!("{line}");
    }
}

/// Builds the command for the launcher's client jar and runs it, logging
/// the game's output.
/// # Errors
/// Returns a precondition error before anything is spawned when the client
/// jar or a required directory is missing, and the errors of [`launch`].
pub fn gameruntime(launcher: &Launcher) -> Result<()> {
    gameruntime_with(launcher, &LogSink)
}

/// Same as [`gameruntime`] with a custom output sink.
/// # Errors
/// See [`gameruntime`].
pub fn gameruntime_with<S: OutputSink + Sync + ?Sized>(
    launcher: &Launcher,
    sink: &S,
) -> Result<()> {
    let command = launcher.build_command(&launcher.artifact_path())?;
    info!("Executing command: {command}");
    launch(&command, sink)
}

/// Spawns `command` and blocks until the child closes both stdout and
/// stderr. The exit status is not checked.
///
/// Safe to call from inside a tokio runtime: the child is then driven from
/// a separate thread. Async callers can use [`launch_async`] instead.
/// # Errors
/// Returns [`LaunchError::EmptyCommand`] without spawning when the program
/// is blank, [`LaunchError::Spawn`] when the OS refuses to start it,
/// [`LaunchError::Output`] when a stream cannot be read and
/// [`LaunchError::Runtime`] when no runtime can be created.
pub fn launch<S: OutputSink + Sync + ?Sized>(command: &LaunchCommand, sink: &S) -> Result<()> {
    if command.is_blank() {
        return Err(LaunchError::EmptyCommand);
    }
    if Handle::try_current().is_err() {
        return block_on(command, sink);
    }
    // a nested block_on panics, so give the child its own thread and runtime
    thread::scope(|scope| scope.spawn(|| block_on(command, sink)).join())
        .unwrap_or_else(|payload| panic::resume_unwind(payload))
}

fn block_on<S: OutputSink + ?Sized>(command: &LaunchCommand, sink: &S) -> Result<()> {
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(LaunchError::Runtime)?;
    runtime.block_on(launch_async(command, sink))
}

/// Async form of [`launch`].
/// # Errors
/// See [`launch`], except for [`LaunchError::Runtime`].
pub async fn launch_async<S: OutputSink + ?Sized>(
    command: &LaunchCommand,
    sink: &S,
) -> Result<()> {
    if command.is_blank() {
        return Err(LaunchError::EmptyCommand);
    }
    let mut child = Command::new(&command.program)
        .args(&command.args)
        .envs(command.envs.iter().map(|(k, v)| (k, v)))
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| LaunchError::Spawn {
            program: command.program.clone(),
            source,
        })?;
    debug!("game started with pid {:?}", child.id());

    let (stdout, stderr) = tokio::join!(
        drain(child.stdout.take(), |line| sink.stdout_line(line)),
        drain(child.stderr.take(), |line| sink.stderr_line(line)),
    );
    stdout.and(stderr).map_err(LaunchError::Output)?;

    match child.try_wait() {
        Ok(Some(status)) => debug!("game exited with {status}"),
        Ok(None) => debug!("game closed its output and is still running"),
        Err(e) => debug!("failed to query game status: {e}"),
    }
    Ok(())
}

async fn drain<R, F>(stream: Option<R>, mut emit: F) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let Some(stream) = stream else {
        return Ok(());
    };
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        emit(line.trim_end_matches(['\r', '\n']));
    }
}
