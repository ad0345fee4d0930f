//! Map page served to the embedded renderer.
//!
//! The page hosts a Leaflet map plus the adapter shim that:
//! - defines the global command functions (`setViewport`, `clearAllMarkers`,
//!   `addMarker`, `drawPath`) that host scripts call,
//! - evaluates `command` frames in arrival order,
//! - exposes `window.hostBridge.waypointAdded(lat, lng)` once the handshake
//!   is done, and calls it from the map's context-menu handler,
//! - draws the provisional right-click marker itself; the next full resync
//!   clears it.
//!
//! Assets are kept as `&'static str` so they ship inside the binary.

use foundation::LatLng;
use serde_json::json;

/// Where the overlay controls post UI actions.
pub const ACTION_ADD_MARKER: &str = "/actions/add-marker";
pub const ACTION_CENTER: &str = "/actions/center";
pub const ACTION_CLEAR: &str = "/actions/clear";

pub const BRIDGE_PATH: &str = "/bridge";

/// Everything the page needs to know at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct PageOptions {
    pub title: String,
    pub center: LatLng,
    pub zoom: f64,
    /// Where the drone icon sits; also the initial map center by default.
    pub home: LatLng,
    /// `None` when the icon asset is missing; the page then skips it.
    pub drone_icon_url: Option<String>,
    /// Ask the renderer to send `applied` frames back.
    pub acknowledge: bool,
}

/// Renders the complete page with its configuration inlined.
pub fn render_page(options: &PageOptions) -> String {
    let config = json!({
        "bridgePath": BRIDGE_PATH,
        "center": { "lat": options.center.lat, "lng": options.center.lng },
        "zoom": options.zoom,
        "home": { "lat": options.home.lat, "lng": options.home.lng },
        "droneIconUrl": options.drone_icon_url,
        "acknowledge": options.acknowledge,
        "actions": {
            "addMarker": ACTION_ADD_MARKER,
            "center": ACTION_CENTER,
            "clear": ACTION_CLEAR,
        },
    });
    // JSON is valid script, except that `</` could close the surrounding tag.
    let config = config.to_string().replace("</", "<\\/");

    MAP_PAGE_TEMPLATE
        .replace("__PAGE_TITLE__", &html_escape(&options.title))
        .replace("__MAP_CONFIG__", &config)
        .replace("__ADAPTER_SHIM__", ADAPTER_SHIM_JS)
}

fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

pub const MAP_PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>__PAGE_TITLE__</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css"/>
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
  <style>
    html, body, #map { height: 100%; margin: 0; }
    #controls {
      position: absolute; top: 12px; left: 12px; z-index: 1000;
      display: flex; gap: 6px; align-items: center;
      padding: 6px 8px; border-radius: 6px;
      background: rgba(0, 0, 0, 0.5); color: white; font: 13px sans-serif;
    }
    #controls input { width: 110px; }
  </style>
</head>
<body>
  <div id="map"></div>
  <div id="controls">
    <span>Marker:</span>
    <input id="lat-input" placeholder="lat">
    <input id="lng-input" placeholder="lng">
    <button id="add-btn">Add Marker</button>
    <button id="center-btn">Center Map</button>
    <button id="clear-btn">Clear Markers</button>
  </div>
  <script>
    window.__MAP_CONFIG = __MAP_CONFIG__;
  </script>
  <script>
__ADAPTER_SHIM__
  </script>
</body>
</html>
"#;

pub const ADAPTER_SHIM_JS: &str = r#"(function () {
  'use strict';
  var config = window.__MAP_CONFIG;

  var map = L.map('map').setView([config.center.lat, config.center.lng], config.zoom);
  L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
    maxZoom: 22,
    attribution: '&copy; OpenStreetMap contributors'
  }).addTo(map);

  var markers = {};
  var provisional = [];
  var route = null;

  function textContent(text) {
    var el = document.createElement('span');
    el.textContent = text;
    return el;
  }

  window.setViewport = function (lat, lng, zoom) {
    var z = (zoom === null || zoom === undefined) ? map.getZoom() : zoom;
    map.setView([lat, lng], z);
  };

  window.clearAllMarkers = function () {
    Object.keys(markers).forEach(function (id) { map.removeLayer(markers[id]); });
    markers = {};
    provisional.forEach(function (m) { map.removeLayer(m); });
    provisional = [];
  };

  window.addMarker = function (id, lat, lng, label) {
    if (markers[id]) {
      map.removeLayer(markers[id]);
    }
    var m = L.marker([lat, lng]).addTo(map);
    if (label) {
      m.bindPopup(textContent(label));
    }
    markers[id] = m;
  };

  window.drawPath = function (coords) {
    if (route) {
      map.removeLayer(route);
      route = null;
    }
    if (coords && coords.length >= 2) {
      route = L.polyline(coords).addTo(map);
    }
  };

  // Optional drone icon: a missing asset only loses the icon.
  if (config.droneIconUrl) {
    var probe = new Image();
    probe.onload = function () {
      var icon = L.icon({
        iconUrl: config.droneIconUrl,
        iconSize: [48, 48],
        iconAnchor: [24, 24],
        popupAnchor: [0, -24]
      });
      L.marker([config.home.lat, config.home.lng], { icon: icon })
        .addTo(map)
        .bindPopup(textContent('Drone position'));
    };
    probe.onerror = function () {
      console.warn('drone icon unavailable, continuing without it');
    };
    probe.src = config.droneIconUrl;
  }

  var socket = null;

  function send(frame) {
    if (socket && socket.readyState === WebSocket.OPEN) {
      socket.send(JSON.stringify(frame));
    }
  }

  function connect() {
    var scheme = location.protocol === 'https:' ? 'wss://' : 'ws://';
    socket = new WebSocket(scheme + location.host + config.bridgePath);

    socket.onopen = function () {
      window.hostBridge = {
        waypointAdded: function (lat, lng) {
          send({ type: 'waypoint_added', lat: lat, lng: lng });
        }
      };
      send({ type: 'ready' });
    };

    socket.onmessage = function (event) {
      var frame;
      try {
        frame = JSON.parse(event.data);
      } catch (e) {
        return;
      }
      if (frame.type !== 'command') {
        return;
      }
      try {
        (new Function(frame.script))();
      } catch (e) {
        console.error('command', frame.seq, 'failed', e);
      }
      if (config.acknowledge) {
        send({ type: 'applied', seq: frame.seq });
      }
    };

    socket.onclose = function () {
      window.hostBridge = null;
      setTimeout(connect, 1000);
    };
  }

  map.on('contextmenu', function (e) {
    var lat = e.latlng.lat;
    var lng = e.latlng.lng;
    var m = L.marker([lat, lng]).addTo(map);
    m.bindPopup(textContent('Waypoint ' + lat.toFixed(6) + ', ' + lng.toFixed(6))).openPopup();
    provisional.push(m);
    // Before the handshake there is no bridge and the report is lost.
    if (window.hostBridge) {
      window.hostBridge.waypointAdded(lat, lng);
    }
  });

  function postAction(path, body) {
    fetch(path, {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify(body || {})
    }).catch(function (e) { console.warn('action failed', path, e); });
  }

  function typedCoordinates() {
    return {
      lat: document.getElementById('lat-input').value,
      lng: document.getElementById('lng-input').value
    };
  }

  document.getElementById('add-btn').onclick = function () {
    postAction(config.actions.addMarker, typedCoordinates());
  };
  document.getElementById('center-btn').onclick = function () {
    postAction(config.actions.center, typedCoordinates());
  };
  document.getElementById('clear-btn').onclick = function () {
    postAction(config.actions.clear);
  };

  connect();
})();"#;
