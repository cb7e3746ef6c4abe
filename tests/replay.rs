use std::{
    fs::{create_dir_all, read, remove_dir_all, write},
    net::Ipv4Addr,
    path::PathBuf,
};

use anyhow::Result;
use codec::checksum::{checksum, udp_checksum};
use turn_offload::{
    config::{Cli, Config, Direction},
    load_flows,
    statistics::Counts,
    startup,
};

fn frame(destination: Ipv4Addr, destination_port: u16, payload: &[u8]) -> Vec<u8> {
    let source = Ipv4Addr::new(10, 0, 0, 1);
    let udp_len = 8 + payload.len();

    let mut ip = vec![0x45, 0x00];
    ip.extend_from_slice(&((20 + udp_len) as u16).to_be_bytes());
    ip.extend_from_slice(&[0x00, 0x01, 0x40, 0x00, 64, 17, 0, 0]);
    ip.extend_from_slice(&source.octets());
    ip.extend_from_slice(&destination.octets());
    let check = checksum(&ip);
    ip[10..12].copy_from_slice(&check.to_be_bytes());

    let mut udp = Vec::with_capacity(udp_len);
    udp.extend_from_slice(&40000u16.to_be_bytes());
    udp.extend_from_slice(&destination_port.to_be_bytes());
    udp.extend_from_slice(&(udp_len as u16).to_be_bytes());
    udp.extend_from_slice(&[0, 0]);
    udp.extend_from_slice(payload);
    let check = udp_checksum(source, destination, &udp);
    udp[6..8].copy_from_slice(&check.to_be_bytes());

    let mut frame = vec![0x02, 0, 0, 0, 0, 0x02, 0x02, 0, 0, 0, 0, 0x01, 0x08, 0x00];
    frame.extend_from_slice(&ip);
    frame.extend_from_slice(&udp);
    frame
}

struct Workspace(PathBuf);

impl Workspace {
    fn new(name: &str) -> Result<Self> {
        let path = std::env::temp_dir().join(format!("turn-offload-{}-{}", name, std::process::id()));
        create_dir_all(path.join("input"))?;
        Ok(Self(path))
    }

    fn input(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.0.join("input").join(name);
        write(&path, bytes)?;
        Ok(path)
    }

    fn output(&self) -> PathBuf {
        self.0.join("output")
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = remove_dir_all(&self.0);
    }
}

const CONFIG: &str = r#"
{
    log: { level: "info" },
    flows: [
        { destination: "10.0.0.5:5000", "local-port": 6000, "channel-id": 1 },
        { destination: "10.0.0.6:5000", "local-port": 6001 },
    ],
}
"#;

#[test]
fn test_load_flows() -> Result<()> {
    let config: Config = CONFIG.parse()?;
    let table = load_flows(&config)?;

    assert_eq!(table.len(), 2);
    assert_eq!(table.get("10.0.0.6:5000".parse()?)?.local_port, 6001);

    let duplicate: Config = r#"
    {
        flows: [
            { destination: "10.0.0.5:5000", "local-port": 6000 },
            { destination: "10.0.0.5:5000", "local-port": 6001 },
        ],
    }
    "#
    .parse()?;

    assert!(load_flows(&duplicate).is_err());
    Ok(())
}

#[test]
fn test_egress_replay() -> Result<()> {
    let workspace = Workspace::new("egress")?;
    let config: Config = CONFIG.parse()?;

    let payload = [0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88];
    let channel = frame(Ipv4Addr::new(10, 0, 0, 5), 5000, &payload);
    let port = frame(Ipv4Addr::new(10, 0, 0, 6), 5000, &payload);
    let other = frame(Ipv4Addr::new(10, 0, 0, 7), 5000, &payload);

    let cli = Cli {
        config: None,
        direction: Direction::Egress,
        output: Some(workspace.output()),
        frames: vec![
            workspace.input("channel.bin", &channel)?,
            workspace.input("port.bin", &port)?,
            workspace.input("other.bin", &other)?,
            workspace.input("truncated.bin", &channel[..46])?,
        ],
    };

    let counts = startup(&config, &cli)?;
    assert_eq!(
        counts,
        Counts {
            received_bytes: channel.len() * 3 + 46,
            received_pkts: 4,
            accepted_pkts: 3,
            dropped_pkts: 1,
            passed_pkts: 1,
            rewritten_ports: 2,
            inserted_channels: 1,
        }
    );

    let output = workspace.output();
    let rewritten = read(output.join("channel.bin"))?;
    assert_eq!(rewritten.len(), channel.len() + 4);
    assert_eq!(&rewritten[36..38], &6000u16.to_be_bytes());
    assert_eq!(&rewritten[42..46], &[0x00, 0x01, 0x00, 0x08]);
    assert_eq!(&rewritten[46..], &payload);

    assert_eq!(read(output.join("port.bin"))?.len(), port.len());
    assert_eq!(read(output.join("other.bin"))?, other);
    assert!(!output.join("truncated.bin").exists());

    Ok(())
}

#[test]
fn test_ingress_replay() -> Result<()> {
    let workspace = Workspace::new("ingress")?;
    let config: Config = "{ ingress: { port: 3478 } }".parse()?;

    let relayed = frame(Ipv4Addr::new(10, 0, 0, 9), 3478, &[0x40, 0x01, 0x00, 0x00]);
    let other = frame(Ipv4Addr::new(10, 0, 0, 9), 3479, b"other");

    let cli = Cli {
        config: None,
        direction: Direction::Ingress,
        output: Some(workspace.output()),
        frames: vec![
            workspace.input("relayed.bin", &relayed)?,
            workspace.input("other.bin", &other)?,
        ],
    };

    let counts = startup(&config, &cli)?;
    assert_eq!(counts.received_pkts, 2);
    assert_eq!(counts.accepted_pkts, 2);
    assert_eq!(counts.passed_pkts, 1);
    assert_eq!(counts.dropped_pkts, 0);

    assert_eq!(read(workspace.output().join("relayed.bin"))?, relayed);
    assert_eq!(read(workspace.output().join("other.bin"))?, other);

    Ok(())
}

#[test]
fn test_frame_capacity() -> Result<()> {
    let workspace = Workspace::new("capacity")?;
    let payload = [0u8; 64];
    let channel = frame(Ipv4Addr::new(10, 0, 0, 5), 5000, &payload);

    let config: Config = format!(
        r#"{{
            flows: [{{ destination: "10.0.0.5:5000", "channel-id": 16385 }}],
            frame: {{ capacity: {} }},
        }}"#,
        channel.len() + 3
    )
    .parse()?;

    let cli = Cli {
        config: None,
        direction: Direction::Egress,
        output: None,
        frames: vec![workspace.input("channel.bin", &channel)?],
    };

    let counts = startup(&config, &cli)?;
    assert_eq!(counts.dropped_pkts, 1);
    assert_eq!(counts.inserted_channels, 0);

    Ok(())
}
