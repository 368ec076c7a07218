//! Threaded execution of a [`DspBlock`].
//!
//! A [`Worker`] owns one block and the two stream ends it is wired to. While
//! stopped the block sits inside the worker and commands are applied to it
//! directly. [`Worker::start`] moves the block onto a dedicated thread that
//! pulls batches from the input stream, processes them and pushes the
//! results downstream. [`Worker::stop`] wakes the thread, joins it and takes
//! the block back, so its state survives a stop/start cycle.
//!
//! Commands and input rewiring sent while running are queued and applied by
//! the thread between two batches, never in the middle of one.

use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, select, Receiver, Sender, TrySendError};
use tracing::{debug, trace, warn};

use crate::dsp::DspBlock;
use crate::error::{Error, Result};
use crate::stream::Stream;

/// Messages delivered to a running worker thread.
enum Control<B: DspBlock> {
    Block(B::Command),
    SetInput(Receiver<Vec<B::Input>>),
}

/// What woke the worker thread up.
enum Event<B: DspBlock> {
    Stop,
    Batch(Vec<B::Input>),
    Control(Control<B>),
}

struct Running<B: DspBlock> {
    stop: Sender<()>,
    control: Sender<Control<B>>,
    handle: JoinHandle<B>,
}

/// A [`DspBlock`] together with the thread that runs it.
pub struct Worker<B: DspBlock> {
    name: String,
    block: Option<B>,
    input: Receiver<Vec<B::Input>>,
    output: Sender<Vec<B::Output>>,
    running: Option<Running<B>>,
}

impl<B> Worker<B>
where
    B: DspBlock + Send + 'static,
    B::Input: Send + 'static,
    B::Output: Send + 'static,
    B::Command: Send + 'static,
{
    /// Wire `block` between two streams. The worker starts stopped.
    pub fn new(
        name: impl Into<String>,
        block: B,
        input: &Stream<B::Input>,
        output: &Stream<B::Output>,
    ) -> Self {
        Self {
            name: name.into(),
            block: Some(block),
            input: input.receiver(),
            output: output.sender(),
            running: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// The block, when the worker is stopped.
    pub fn block(&self) -> Option<&B> {
        self.block.as_ref()
    }

    /// Spawn the processing thread. Does nothing if already running.
    pub fn start(&mut self) -> Result<()> {
        if self.running.is_some() {
            return Ok(());
        }
        let block = self
            .block
            .take()
            .ok_or_else(|| Error::WorkerPanicked(self.name.clone()))?;

        let (stop_tx, stop_rx) = channel::bounded::<()>(0);
        let (control_tx, control_rx) = channel::unbounded();
        let input = self.input.clone();
        let output = self.output.clone();
        let name = self.name.clone();

        let handle = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || run(name, block, input, output, stop_rx, control_rx))
            .map_err(|e| Error::SpawnFailed(e.to_string()))?;

        debug!("worker '{}' started", self.name);
        self.running = Some(Running {
            stop: stop_tx,
            control: control_tx,
            handle,
        });
        Ok(())
    }

    /// Stop the processing thread and take the block back.
    ///
    /// Does nothing if already stopped.
    pub fn stop(&mut self) -> Result<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        // Disconnecting the stop channel wakes the thread wherever it waits
        drop(running.stop);
        drop(running.control);

        match running.handle.join() {
            Ok(block) => {
                self.block = Some(block);
                debug!("worker '{}' stopped", self.name);
                Ok(())
            }
            Err(_) => {
                warn!("worker '{}' panicked", self.name);
                Err(Error::WorkerPanicked(self.name.clone()))
            }
        }
    }

    /// Deliver a command to the block.
    ///
    /// A running block applies it before its next batch; a stopped block
    /// applies it immediately.
    pub fn send(&mut self, command: B::Command) -> Result<()> {
        if let Some(running) = &self.running {
            return running
                .control
                .send(Control::Block(command))
                .map_err(|_| Error::WorkerPanicked(self.name.clone()));
        }
        match self.block.as_mut() {
            Some(block) => {
                block.handle(command);
                Ok(())
            }
            None => Err(Error::WorkerPanicked(self.name.clone())),
        }
    }

    /// Read from a different stream from the next batch on.
    pub fn set_input(&mut self, input: &Stream<B::Input>) -> Result<()> {
        self.input = input.receiver();
        if let Some(running) = &self.running {
            running
                .control
                .send(Control::SetInput(input.receiver()))
                .map_err(|_| Error::WorkerPanicked(self.name.clone()))?;
        }
        Ok(())
    }
}

impl<B: DspBlock> Drop for Worker<B> {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            drop(running.stop);
            drop(running.control);
            if running.handle.join().is_err() {
                warn!("worker '{}' panicked", self.name);
            }
        }
    }
}

fn apply<B: DspBlock>(block: &mut B, input: &mut Receiver<Vec<B::Input>>, control: Control<B>) {
    match control {
        Control::Block(command) => block.handle(command),
        Control::SetInput(rx) => *input = rx,
    }
}

fn run<B: DspBlock>(
    name: String,
    mut block: B,
    mut input: Receiver<Vec<B::Input>>,
    output: Sender<Vec<B::Output>>,
    stop: Receiver<()>,
    control: Receiver<Control<B>>,
) -> B {
    loop {
        let event = select! {
            recv(stop) -> _ => Event::Stop,
            recv(control) -> msg => match msg {
                Ok(message) => Event::Control(message),
                Err(_) => Event::Stop,
            },
            recv(input) -> msg => match msg {
                Ok(batch) => Event::Batch(batch),
                Err(_) => Event::Stop,
            },
        };

        let batch = match event {
            Event::Stop => break,
            Event::Control(message) => {
                apply(&mut block, &mut input, message);
                continue;
            }
            Event::Batch(batch) => batch,
        };

        // Commands queued before this batch was pushed apply to it
        for message in control.try_iter() {
            apply(&mut block, &mut input, message);
        }

        let out = block.process(&batch);
        if out.is_empty() {
            continue;
        }

        // Only a worker blocked on a full output gives up its batch on stop
        let out = match output.try_send(out) {
            Ok(()) => continue,
            Err(TrySendError::Disconnected(_)) => break,
            Err(TrySendError::Full(out)) => out,
        };
        let delivered = select! {
            send(output, out) -> res => res.is_ok(),
            recv(stop) -> _ => false,
        };
        if !delivered {
            break;
        }
    }

    trace!("worker '{}' leaving processing loop", name);
    block
}
