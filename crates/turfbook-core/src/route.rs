//! Route ordering — a walking order for the doors of a turf.
//!
//! Greedy nearest-neighbour, run once from every door; the cheapest tour
//! wins. Cost is squared scaled distance, discounted for doors on the same
//! street and again for doors on the same side of it. O(n³), which is fine
//! for turfs of a few dozen doors.

use serde::Serialize;

use crate::{
  Database, Error, Result,
  id::{DoorId, TurfId},
  record::{Door, GeoPoint},
};

/// Degrees are multiplied by this before squaring so that street bonuses
/// only break near-ties between close neighbours.
const COORD_SCALE: f64 = 1000.0;
const SAME_STREET_BONUS: f64 = 10.0;
const SAME_SIDE_BONUS: f64 = 5.0;

/// One door, as the route planner sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
  pub id:      DoorId,
  pub point:   GeoPoint,
  pub address: String,
}

impl Stop {
  /// Fails with [`Error::MissingGeocode`] for doors without coordinates.
  pub fn from_door(door: &Door) -> Result<Self> {
    let id = door.id.ok_or_else(|| {
      Error::InvariantViolation("route requested for an unsaved door".into())
    })?;
    let point = door.location.ok_or(Error::MissingGeocode(id))?;
    Ok(Self { id, point, address: door.address.clone() })
  }

  fn house_number(&self) -> Option<u64> {
    let end = self
      .address
      .find(|c: char| !c.is_ascii_digit())
      .unwrap_or(self.address.len());
    self.address[..end].parse().ok()
  }

  fn street(&self) -> impl Iterator<Item = &str> + '_ {
    self.address.split_whitespace().skip(1)
  }
}

/// Cost of walking from `from` to `to`.
pub fn cost(from: &Stop, to: &Stop) -> f64 {
  let dlat = (to.point.lat - from.point.lat) * COORD_SCALE;
  let dlon = (to.point.lon - from.point.lon) * COORD_SCALE;
  let mut cost = dlat * dlat + dlon * dlon;

  if to.street().eq(from.street()) {
    cost -= SAME_STREET_BONUS;
    if let (Some(a), Some(b)) = (to.house_number(), from.house_number())
      && a % 2 == b % 2
    {
      cost -= SAME_SIDE_BONUS;
    }
  }
  cost
}

/// A complete visiting order and its total cost.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
  pub doors: Vec<DoorId>,
  pub cost:  f64,
}

/// Greedy tour from `stops[start]`. Ties go to the stop listed first.
fn tour_from(stops: &[Stop], start: usize) -> Route {
  let mut remaining: Vec<&Stop> = stops.iter().collect();
  let mut current = remaining.remove(start);
  let mut route = Route { doors: vec![current.id], cost: 0.0 };

  while !remaining.is_empty() {
    let mut best = 0;
    let mut best_cost = cost(current, remaining[0]);
    for (i, stop) in remaining.iter().enumerate().skip(1) {
      let c = cost(current, stop);
      if c < best_cost {
        best = i;
        best_cost = c;
      }
    }

    current = remaining.remove(best);
    route.doors.push(current.id);
    route.cost += best_cost;
  }
  route
}

/// The cheapest greedy tour over `stops`; equal-cost tours resolve to the
/// one starting at the lowest door identifier.
pub fn plan(stops: &[Stop]) -> Route {
  (0..stops.len())
    .map(|start| tour_from(stops, start))
    .min_by(|a, b| {
      a.cost
        .total_cmp(&b.cost)
        .then_with(|| a.doors[0].cmp(&b.doors[0]))
    })
    .unwrap_or(Route { doors: Vec::new(), cost: 0.0 })
}

/// Plan a route over `doors`, resolving each through `lookup`.
pub fn order(
  doors: &[DoorId],
  mut lookup: impl FnMut(DoorId) -> Result<Stop>,
) -> Result<Route> {
  let stops = doors
    .iter()
    .map(|&id| lookup(id))
    .collect::<Result<Vec<_>>>()?;
  Ok(plan(&stops))
}

impl Database {
  /// The route for a turf's doors. Every door must be geocoded.
  ///
  /// Reads `turf.doors` as stored, so doors moved by a `save` since the last
  /// reconcile are not reflected. [`Database::reorder_turf`] reconciles first.
  pub fn route(&self, turf: TurfId) -> Result<Route> {
    let turf = self.turfs.get_ref(turf)?;
    order(&turf.doors, |id| Stop::from_door(self.doors.get_ref(id)?))
  }

  /// Store the planned route as the turf's door order.
  pub fn reorder_turf(&mut self, turf: TurfId) -> Result<Route> {
    self.reconcile()?;
    let route = self.route(turf)?;
    self.turfs.get_mut(turf)?.doors.clone_from(&route.doors);
    tracing::debug!(%turf, cost = route.cost, "reordered turf");
    Ok(route)
  }

  /// Reorder every walk turf; phone-bank turfs are skipped. Nothing is
  /// written unless every route can be planned.
  pub fn reorder_all_turfs(&mut self) -> Result<usize> {
    self.reconcile()?;
    let routes = self
      .turfs
      .iter()
      .filter(|turf| !turf.is_phonebank())
      .filter_map(|turf| turf.id)
      .map(|id| self.route(id).map(|route| (id, route)))
      .collect::<Result<Vec<_>>>()?;

    for (id, route) in &routes {
      self.turfs.get_mut(*id)?.doors.clone_from(&route.doors);
    }
    tracing::info!(turfs = routes.len(), "reordered turfs");
    Ok(routes.len())
  }
}
