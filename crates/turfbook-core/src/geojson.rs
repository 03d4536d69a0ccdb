//! GeoJSON export of geocoded doors, for mapping tools and the turf map.

use serde_json::{Value, json};

use crate::{Database, Result, id::TurfId, record::Door};

/// An RFC 7946 `FeatureCollection` (CRS84) with one point per geocoded door.
/// Doors without a geocode are left out.
pub fn doors_feature_collection<'a>(
  doors: impl IntoIterator<Item = &'a Door>,
) -> Value {
  let features: Vec<Value> = doors
    .into_iter()
    .filter_map(|door| {
      let point = door.location?;
      Some(json!({
        "type": "Feature",
        "geometry": {
          "type": "Point",
          "coordinates": [point.lon, point.lat],
        },
        "properties": {
          "id": door.id,
          "turf_id": door.turf_id,
          "address": door.address,
          "unit": door.unit,
          "city": door.city,
          "n_voters": door.voters.len(),
        },
      }))
    })
    .collect();

  tracing::debug!(features = features.len(), "built door feature collection");
  json!({
    "type": "FeatureCollection",
    "crs": {
      "type": "name",
      "properties": { "name": "urn:ogc:def:crs:OGC:1.3:CRS84" },
    },
    "features": features,
  })
}

impl Database {
  /// Geocoded doors of one turf (in route order), or of the whole store.
  pub fn geojson(&self, turf: Option<TurfId>) -> Result<Value> {
    let Some(turf) = turf else {
      return Ok(doors_feature_collection(self.doors.iter()));
    };

    let doors = self
      .turfs
      .get_ref(turf)?
      .doors
      .iter()
      .map(|&id| self.doors.get_ref(id))
      .collect::<Result<Vec<_>>>()?;
    Ok(doors_feature_collection(doors))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    id::DoorId,
    record::{DoorPatch, GeoPoint, TurfPatch},
  };

  #[test]
  fn only_geocoded_doors_become_features() {
    let mut db = Database::new();
    db.save(None, TurfPatch::creating("t")).unwrap();
    db.save(None, DoorPatch {
      turf_id: Some(TurfId(0)).into(),
      address: "4 Birch Ln".to_string().into(),
      location: Some(GeoPoint::new(44.95, -93.1)).into(),
      ..DoorPatch::creating("t")
    })
    .unwrap();
    db.save(None, DoorPatch {
      address: "6 Birch Ln".to_string().into(),
      ..DoorPatch::creating("t")
    })
    .unwrap();
    db.reconcile().unwrap();

    let all = db.geojson(None).unwrap();
    let features = all["features"].as_array().unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0]["properties"]["id"], 0);
    assert_eq!(
      features[0]["geometry"]["coordinates"],
      serde_json::json!([-93.1, 44.95])
    );

    let turf = db.geojson(Some(TurfId(0))).unwrap();
    assert_eq!(turf["features"].as_array().unwrap().len(), 1);
    assert!(db.door(DoorId(1)).unwrap().turf_id.is_none());
  }
}
