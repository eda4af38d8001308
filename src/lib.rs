/// Portalban: a Sokoban variant with coins, lava and paired portals.
///
/// `domain` holds tiles, coordinates and the pure movement rules,
/// `sim` the level catalog and the stateful engine, `ui` the terminal
/// front-end. The engine never touches terminal I/O.

pub mod config;
pub mod domain;
pub mod sim;
pub mod ui;
