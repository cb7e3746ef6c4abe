use std::{
    net::{Ipv4Addr, SocketAddrV4},
    sync::Arc,
};

use ahash::{HashMap, HashMapExt};
use arc_swap::ArcSwap;
use parking_lot::Mutex;

/// Translation state of one (destination port, destination address) pair.
///
/// A zero `local_port` leaves the destination port alone, a zero
/// `channel_id` leaves the datagram unframed. A state with both fields zero
/// is the same as no state at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowState {
    pub local_port: u16,
    pub channel_id: u16,
}

impl FlowState {
    pub fn is_empty(&self) -> bool {
        self.local_port == 0 && self.channel_id == 0
    }
}

/// The read side of the flow state, as seen from the data path.
///
/// Implementations must answer without blocking and must never hand out a
/// partially written state.
pub trait FlowStateStore: Send + Sync {
    fn lookup(&self, port: u16, address: Ipv4Addr) -> Option<FlowState>;
}

impl<T> FlowStateStore for Arc<T>
where
    T: FlowStateStore + ?Sized,
{
    fn lookup(&self, port: u16, address: Ipv4Addr) -> Option<FlowState> {
        self.as_ref().lookup(port, address)
    }
}

impl<T> FlowStateStore for &T
where
    T: FlowStateStore + ?Sized,
{
    fn lookup(&self, port: u16, address: Ipv4Addr) -> Option<FlowState> {
        (*self).lookup(port, address)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    AlreadyExists,
    NotFound,
}

impl std::error::Error for StoreError {}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

type AddressTable = HashMap<Ipv4Addr, FlowState>;
type PortTable = HashMap</* port */ u16, Arc<AddressTable>>;

/// Two level flow table: destination port, then destination address.
///
/// Readers load the current snapshot without taking a lock. Writers are
/// serialised, copy the levels they touch and publish a new snapshot, so a
/// reader sees either the old or the new state of an entry.
///
/// # Test
///
/// ```
/// use turn_offload_service::store::*;
///
/// let table = FlowTable::default();
/// let state = FlowState {
///     local_port: 6000,
///     channel_id: 0x4001,
/// };
///
/// table.insert("10.0.0.5:5000".parse().unwrap(), state).unwrap();
///
/// assert_eq!(table.lookup(5000, "10.0.0.5".parse().unwrap()), Some(state));
/// assert_eq!(table.lookup(5000, "10.0.0.6".parse().unwrap()), None);
/// assert_eq!(table.lookup(5001, "10.0.0.5".parse().unwrap()), None);
/// ```
pub struct FlowTable {
    tables: ArcSwap<PortTable>,
    writer: Mutex<()>,
}

impl Default for FlowTable {
    fn default() -> Self {
        Self {
            tables: ArcSwap::from_pointee(PortTable::new()),
            writer: Mutex::new(()),
        }
    }
}

impl FlowTable {
    /// Add the state for `destination`, failing if it already has one.
    ///
    /// The address table for the destination port is created on first use.
    pub fn insert(&self, destination: SocketAddrV4, state: FlowState) -> Result<(), StoreError> {
        self.modify(|tables| {
            let addresses = Arc::make_mut(tables.entry(destination.port()).or_default());
            if addresses.contains_key(destination.ip()) {
                return Err(StoreError::AlreadyExists);
            }

            addresses.insert(*destination.ip(), state);
            Ok(())
        })?;

        log::debug!("flow state added: destination={}, state={:?}", destination, state);
        Ok(())
    }

    /// Create or replace the state for `destination`, returning the previous
    /// one.
    pub fn update(&self, destination: SocketAddrV4, state: FlowState) -> Option<FlowState> {
        let previous = self
            .modify(|tables| {
                Ok(Arc::make_mut(tables.entry(destination.port()).or_default())
                    .insert(*destination.ip(), state))
            })
            .ok()
            .flatten();

        log::debug!("flow state updated: destination={}, state={:?}", destination, state);
        previous
    }

    pub fn get(&self, destination: SocketAddrV4) -> Result<FlowState, StoreError> {
        self.lookup(destination.port(), *destination.ip())
            .ok_or(StoreError::NotFound)
    }

    /// Remove the state for `destination`; an address table left empty is
    /// removed with it.
    pub fn remove(&self, destination: SocketAddrV4) -> Result<FlowState, StoreError> {
        let state = self.modify(|tables| {
            let addresses = tables
                .get_mut(&destination.port())
                .ok_or(StoreError::NotFound)?;

            let state = Arc::make_mut(addresses)
                .remove(destination.ip())
                .ok_or(StoreError::NotFound)?;

            if addresses.is_empty() {
                tables.remove(&destination.port());
            }

            Ok(state)
        })?;

        log::debug!("flow state removed: destination={}", destination);
        Ok(state)
    }

    /// Number of (port, address) entries.
    pub fn len(&self) -> usize {
        self.tables.load().values().map(|it| it.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.load().is_empty()
    }

    fn modify<F, R>(&self, handle: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut PortTable) -> Result<R, StoreError>,
    {
        let _guard = self.writer.lock();

        let mut tables = PortTable::clone(&self.tables.load());
        let ret = handle(&mut tables)?;

        self.tables.store(Arc::new(tables));
        Ok(ret)
    }
}

impl FlowStateStore for FlowTable {
    fn lookup(&self, port: u16, address: Ipv4Addr) -> Option<FlowState> {
        self.tables.load().get(&port)?.get(&address).copied()
    }
}
