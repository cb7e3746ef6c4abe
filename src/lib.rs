pub mod config;
pub mod statistics;

use std::{
    fs::{create_dir_all, read, write},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Result;
use codec::buffer::Frame;
use service::{Program, egress::EgressRewriter, ingress::IngressClassifier, store::FlowTable};

use self::{
    config::{Cli, Config, Direction},
    statistics::{Count, Counts, Stats},
};

/// Build the flow table the egress program reads from, one entry per
/// configured flow.
///
/// A destination configured twice is a configuration error.
pub fn load_flows(config: &Config) -> Result<Arc<FlowTable>> {
    let table = Arc::new(FlowTable::default());
    for flow in &config.flows {
        table
            .insert(flow.destination, flow.state())
            .map_err(|e| anyhow::anyhow!("flow {}: {}", flow.destination, e))?;
    }

    log::info!("flow table loaded: entries={}", table.len());
    Ok(table)
}

/// Replays raw frames through a packet program.
///
/// Every file holds one Ethernet frame. The frame is run through the program
/// and, if the program accepts it, written under the same file name to the
/// output directory.
pub struct Replay<'a, P> {
    program: P,
    capacity: usize,
    output: Option<&'a Path>,
    counts: Counts<Count>,
}

impl<'a, P> Replay<'a, P>
where
    P: Program,
{
    pub fn new(program: P, capacity: usize, output: Option<&'a Path>) -> Self {
        Self {
            counts: Counts::default(),
            program,
            capacity,
            output,
        }
    }

    /// Run one frame through the program, returning the frame if it was
    /// accepted.
    pub fn process(&self, bytes: &[u8]) -> Option<Frame> {
        self.counts
            .add_all(&[Stats::ReceivedPkts(1), Stats::ReceivedBytes(bytes.len())]);

        let mut frame = Frame::new(bytes, self.capacity);
        match self.program.run(&mut frame) {
            Ok(outcome) => {
                self.counts.add_outcome(&outcome);
                Some(frame)
            }
            Err(_) => {
                self.counts.add(&Stats::DroppedPkts(1));
                None
            }
        }
    }

    pub fn replay_file(&self, path: &Path) -> Result<()> {
        let Some(frame) = self.process(&read(path)?) else {
            log::info!("frame dropped: file={:?}", path);
            return Ok(());
        };

        if let Some(output) = self.output.and_then(|it| output_path(it, path)) {
            write(output, frame.as_ref())?;
        }

        Ok(())
    }

    pub fn counts(&self) -> Counts<usize> {
        self.counts.snapshot()
    }
}

fn replay<P>(program: P, config: &Config, cli: &Cli) -> Result<Counts<usize>>
where
    P: Program,
{
    let replay = Replay::new(program, config.frame.capacity, cli.output.as_deref());
    for path in &cli.frames {
        replay.replay_file(path)?;
    }

    Ok(replay.counts())
}

/// Load the flow state and replay every frame given on the command line
/// through the selected program.
///
/// This stands in for the host that attaches the programs to an interface,
/// and lets integration tests drive the whole path without one.
pub fn startup(config: &Config, cli: &Cli) -> Result<Counts<usize>> {
    if let Some(output) = &cli.output {
        create_dir_all(output)?;
    }

    let counts = match cli.direction {
        Direction::Egress => replay(EgressRewriter::new(load_flows(config)?), config, cli)?,
        Direction::Ingress => replay(IngressClassifier::new(config.ingress.port), config, cli)?,
    };

    log::info!(
        "replay finished: received={}, bytes={}, accepted={}, dropped={}, passed={}, ports={}, channels={}",
        counts.received_pkts,
        counts.received_bytes,
        counts.accepted_pkts,
        counts.dropped_pkts,
        counts.passed_pkts,
        counts.rewritten_ports,
        counts.inserted_channels
    );

    Ok(counts)
}

/// Output path of a replayed frame.
pub fn output_path(output: &Path, frame: &Path) -> Option<PathBuf> {
    frame.file_name().map(|name| output.join(name))
}
