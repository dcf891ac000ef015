//! Leaflet page skeleton.
//!
//! `__NAME__` placeholders are substituted by [`super::MapDocument`].
//! JSON placeholders receive data that has already been made script-safe.

pub const MAP_HTML: &str = r#"<!doctype html>
<html lang="en">

<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>__TITLE__</title>

  <!-- Leaflet 1.9.4 -->
  <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.css" crossorigin="anonymous"
    referrerpolicy="no-referrer" />
  <script src="https://cdnjs.cloudflare.com/ajax/libs/leaflet/1.9.4/leaflet.js" crossorigin="anonymous"
    referrerpolicy="no-referrer"></script>

  <!-- Leaflet.markercluster 1.4.1 -->
  <link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.4.1/dist/MarkerCluster.css" />
  <link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.4.1/dist/MarkerCluster.Default.css" />
  <script src="https://unpkg.com/leaflet.markercluster@1.4.1/dist/leaflet.markercluster.js"></script>

  <style>
    html, body { height: 100%; margin: 0; padding: 0; }
    #map { position: absolute; inset: 0; }
  </style>
</head>

<body>
  <div id="map"></div>

  <script>
    const CENTER = __CENTER__;
    const ZOOM = __ZOOM__;
    const BASEMAPS = __BASEMAPS__;
    const MARKERS = __MARKERS__;
    const OVERLAY = __OVERLAY__;

    const map = L.map('map', { center: CENTER, zoom: ZOOM });

    const baseLayers = {};
    BASEMAPS.forEach((basemap, i) => {
      const layer = L.tileLayer(basemap.url, {
        attribution: basemap.attribution,
        maxZoom: basemap.max_zoom
      });
      if (i === 0) layer.addTo(map);
      baseLayers[basemap.name] = layer;
    });

    const cluster = L.markerClusterGroup();
    MARKERS.forEach((m) => {
      L.marker([m.lat, m.lon], { title: m.title }).bindPopup(m.popup).addTo(cluster);
    });
    cluster.addTo(map);

    L.control.layers(baseLayers, { [OVERLAY]: cluster }).addTo(map);
  </script>
</body>

</html>
"#;
