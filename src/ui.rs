use crate::models::{AttendanceRecord, Dashboard, DraftView, UserProfile};
use crate::stats::display_timestamp;
use chrono::FixedOffset;
use std::fmt::Write;

/// Rows shown in the rendered activity log; the API returns all of them.
const LOG_LIMIT: usize = 50;

pub fn render_index(
    user: &UserProfile,
    draft: &DraftView,
    dashboard: &Dashboard,
    records: &[AttendanceRecord],
    offset: FixedOffset,
) -> String {
    let stats = &dashboard.stats;
    INDEX_HTML
        .replace("{{USER_NAME}}", &escape_html(&user.name))
        .replace("{{USER_ROLE}}", &escape_html(&user.role))
        .replace("{{USER_UNIT}}", &escape_html(&user.unit))
        .replace("{{AVATAR}}", &escape_html(&user.avatar))
        .replace("{{STATUS_OPTIONS}}", &status_options(draft))
        .replace("{{NOTE}}", &escape_html(&draft.note))
        .replace("{{PHOTO_READY}}", if draft.photo_attached { "true" } else { "false" })
        .replace("{{TOTAL}}", &stats.total.to_string())
        .replace("{{PRESENT}}", &stats.present.to_string())
        .replace("{{LATE}}", &stats.late.to_string())
        .replace("{{RATE}}", &stats.discipline_rate.to_string())
        .replace("{{DISTRIBUTION}}", &distribution_items(dashboard))
        .replace("{{DAILY}}", &daily_bars(dashboard))
        .replace("{{RECAP_ROWS}}", &recap_rows(dashboard))
        .replace("{{LOG_ROWS}}", &log_rows(records, offset))
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            _ => out.push(ch),
        }
    }
    out
}

fn status_options(draft: &DraftView) -> String {
    let mut out = String::new();
    for status in crate::models::AttendanceStatus::ALL {
        let selected = if status == draft.status { " selected" } else { "" };
        let _ = write!(out, r#"<option value="{status}"{selected}>{status}</option>"#);
    }
    out
}

fn distribution_items(dashboard: &Dashboard) -> String {
    if dashboard.distribution.is_empty() {
        return r#"<li class="empty">Belum ada data</li>"#.to_string();
    }
    let mut out = String::new();
    for entry in &dashboard.distribution {
        let _ = write!(
            out,
            r#"<li><span class="tag tag-{status}">{status}</span><strong>{count}</strong></li>"#,
            status = entry.status,
            count = entry.count
        );
    }
    out
}

fn daily_bars(dashboard: &Dashboard) -> String {
    let max = dashboard.daily.iter().map(|p| p.total).max().unwrap_or(0);
    if max == 0 {
        return r#"<p class="empty">Belum ada data</p>"#.to_string();
    }
    let mut out = String::new();
    for point in &dashboard.daily {
        let height = point.total * 100 / max;
        let _ = write!(
            out,
            r#"<div class="bar"><div class="fill" style="height:{height}%"></div><span>{date}</span><em>{total}</em></div>"#,
            date = escape_html(&point.date),
            total = point.total
        );
    }
    out
}

fn recap_rows(dashboard: &Dashboard) -> String {
    if dashboard.recap.is_empty() {
        return r#"<tr><td colspan="7" class="empty">Belum ada data</td></tr>"#.to_string();
    }
    let mut out = String::new();
    for row in &dashboard.recap {
        let _ = write!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&row.name),
            row.hadir,
            row.izin,
            row.sakit,
            row.terlambat,
            row.alpa,
            row.total
        );
    }
    out
}

fn log_rows(records: &[AttendanceRecord], offset: FixedOffset) -> String {
    if records.is_empty() {
        return r#"<tr><td colspan="7" class="empty">Belum ada laporan</td></tr>"#.to_string();
    }
    let mut out = String::new();
    for record in records.iter().take(LOG_LIMIT) {
        let location = record
            .location
            .as_ref()
            .map(|l| match &l.address {
                Some(address) => escape_html(address),
                None => format!("{:.5}, {:.5}", l.latitude, l.longitude),
            })
            .unwrap_or_else(|| "-".to_string());
        let _ = write!(
            out,
            r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><span class="tag tag-{}">{}</span></td><td>{}</td><td>{}</td></tr>"#,
            photo_cell(record.photo.as_deref()),
            display_timestamp(&record.timestamp, offset),
            escape_html(&record.user_name),
            record.kind.label(),
            record.status,
            record.status,
            escape_html(record.note.as_deref().unwrap_or("-")),
            location
        );
    }
    out
}

fn photo_cell(photo: Option<&str>) -> String {
    match photo {
        Some(uri) if uri.starts_with("data:image/") => {
            format!(r#"<img class="thumb" src="{}" alt="Foto laporan" />"#, escape_html(uri))
        }
        _ => "-".to_string(),
    }
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="id">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Smart Report Mahasina</title>
  <style>
    :root {
      --bg: #fafafa;
      --ink: #1e293b;
      --brand: #064e3b;
      --accent: #059669;
      --warn: #f59e0b;
      --danger: #ef4444;
      --card: #ffffff;
      --shadow: 0 18px 40px rgba(6, 78, 59, 0.08);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Inter", "Segoe UI", sans-serif;
    }

    header {
      background: var(--brand);
      color: white;
      padding: 24px 32px;
      display: flex;
      align-items: center;
      gap: 16px;
    }

    header img {
      width: 48px;
      height: 48px;
      border-radius: 14px;
      background: white;
    }

    header small {
      display: block;
      color: #6ee7b7;
      text-transform: uppercase;
      letter-spacing: 0.15em;
      font-size: 0.7rem;
    }

    main {
      max-width: 1100px;
      margin: 0 auto;
      padding: 32px 20px 64px;
      display: grid;
      gap: 24px;
    }

    section {
      background: var(--card);
      border-radius: 24px;
      box-shadow: var(--shadow);
      padding: 24px;
    }

    h2 {
      margin: 0 0 16px;
      font-size: 1.1rem;
    }

    .cards {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 16px;
    }

    .card {
      background: var(--card);
      border-radius: 20px;
      box-shadow: var(--shadow);
      padding: 18px;
    }

    .card .label {
      font-size: 0.7rem;
      text-transform: uppercase;
      letter-spacing: 0.12em;
      color: #94a3b8;
    }

    .card .value {
      font-size: 1.8rem;
      font-weight: 800;
    }

    form {
      display: grid;
      gap: 12px;
    }

    select, textarea, input {
      font: inherit;
      padding: 10px 12px;
      border-radius: 12px;
      border: 1px solid #e2e8f0;
    }

    .actions {
      display: flex;
      gap: 12px;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 12px 20px;
      font-weight: 700;
      cursor: pointer;
      background: var(--accent);
      color: white;
    }

    button.secondary {
      background: var(--brand);
    }

    button:disabled {
      opacity: 0.5;
      cursor: not-allowed;
    }

    #message {
      min-height: 1.2em;
      font-weight: 600;
      color: var(--accent);
    }

    #message[data-type="error"] {
      color: var(--danger);
    }

    .split {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(320px, 1fr));
      gap: 24px;
    }

    ul.dist {
      list-style: none;
      padding: 0;
      margin: 0;
      display: grid;
      gap: 8px;
    }

    ul.dist li {
      display: flex;
      justify-content: space-between;
    }

    .chart {
      display: flex;
      align-items: flex-end;
      gap: 10px;
      height: 180px;
    }

    .bar {
      flex: 1;
      display: flex;
      flex-direction: column;
      justify-content: flex-end;
      align-items: center;
      height: 100%;
      font-size: 0.75rem;
    }

    .bar .fill {
      width: 100%;
      background: var(--accent);
      border-radius: 8px 8px 0 0;
    }

    table {
      width: 100%;
      border-collapse: collapse;
      font-size: 0.9rem;
    }

    th, td {
      text-align: left;
      padding: 10px 8px;
      border-bottom: 1px solid #f1f5f9;
    }

    .tag {
      padding: 2px 10px;
      border-radius: 999px;
      font-size: 0.75rem;
      font-weight: 700;
      background: #ecfdf5;
      color: var(--accent);
    }

    .tag-Terlambat { background: #fffbeb; color: var(--warn); }
    .tag-Alpa { background: #fef2f2; color: var(--danger); }
    .tag-Izin, .tag-Sakit { background: #eef2ff; color: #6366f1; }

    .empty {
      color: #94a3b8;
    }

    .thumb {
      width: 48px;
      height: 48px;
      object-fit: cover;
      border-radius: 12px;
    }

    #insight {
      white-space: pre-wrap;
      line-height: 1.6;
    }
  </style>
</head>
<body>
  <header>
    <img src="{{AVATAR}}" alt="Profil" />
    <div>
      <strong>{{USER_NAME}}</strong>
      <small>{{USER_ROLE}} &middot; {{USER_UNIT}}</small>
    </div>
  </header>

  <main>
    <section>
      <h2>Kirim Laporan</h2>
      <form id="report-form">
        <label>Status
          <select id="status">{{STATUS_OPTIONS}}</select>
        </label>
        <label>Ringkasan kegiatan
          <textarea id="note" rows="3">{{NOTE}}</textarea>
        </label>
        <label>Foto bukti
          <input id="photo" type="file" accept="image/*" capture="environment" />
        </label>
        <div class="actions">
          <button type="button" data-kind="In">Absen Masuk</button>
          <button type="button" data-kind="Out" class="secondary">Absen Pulang</button>
        </div>
        <p id="message"></p>
      </form>
    </section>

    <div class="cards">
      <div class="card"><div class="label">Total Laporan</div><div class="value">{{TOTAL}}</div></div>
      <div class="card"><div class="label">Hadir</div><div class="value">{{PRESENT}}</div></div>
      <div class="card"><div class="label">Keterlambatan</div><div class="value">{{LATE}}</div></div>
      <div class="card"><div class="label">Disiplin</div><div class="value">{{RATE}}%</div></div>
    </div>

    <div class="split">
      <section>
        <h2>Proporsi Status</h2>
        <ul class="dist">{{DISTRIBUTION}}</ul>
      </section>
      <section>
        <h2>Tren Laporan</h2>
        <div class="chart">{{DAILY}}</div>
      </section>
    </div>

    <section>
      <h2>Rekap per Pegawai</h2>
      <table>
        <thead><tr><th>Nama</th><th>Hadir</th><th>Izin</th><th>Sakit</th><th>Terlambat</th><th>Alpa</th><th>Total</th></tr></thead>
        <tbody>{{RECAP_ROWS}}</tbody>
      </table>
    </section>

    <section>
      <h2>Analisis AI</h2>
      <button type="button" id="insight-btn">Buat Analisis</button>
      <div id="insight"></div>
    </section>

    <section>
      <h2>Log Aktivitas</h2>
      <table>
        <thead><tr><th>Foto</th><th>Waktu</th><th>Pengirim</th><th>Tipe</th><th>Status</th><th>Catatan</th><th>Lokasi</th></tr></thead>
        <tbody>{{LOG_ROWS}}</tbody>
      </table>
    </section>
  </main>

  <script>
    const statusEl = document.getElementById('status');
    const noteEl = document.getElementById('note');
    const photoEl = document.getElementById('photo');
    const messageEl = document.getElementById('message');
    const submitButtons = Array.from(document.querySelectorAll('[data-kind]'));
    const insightBtn = document.getElementById('insight-btn');
    const insightEl = document.getElementById('insight');

    let photoReady = {{PHOTO_READY}};
    let sending = false;

    const setMessage = (text, type) => {
      messageEl.textContent = text;
      messageEl.dataset.type = type || '';
    };

    const refreshButtons = () => {
      submitButtons.forEach((btn) => {
        btn.disabled = sending || !photoReady;
      });
    };

    const saveDraft = () =>
      fetch('/api/draft', {
        method: 'PUT',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({ status: statusEl.value, note: noteEl.value }),
      });

    const position = () =>
      new Promise((resolve) => {
        if (!navigator.geolocation) {
          resolve(null);
          return;
        }
        navigator.geolocation.getCurrentPosition(
          (pos) => resolve({ latitude: pos.coords.latitude, longitude: pos.coords.longitude }),
          () => resolve(null),
          { timeout: 10000 }
        );
      });

    photoEl.addEventListener('change', async () => {
      const file = photoEl.files && photoEl.files[0];
      photoReady = false;
      refreshButtons();
      if (!file) {
        await fetch('/api/draft/photo', { method: 'DELETE' });
        return;
      }
      const res = await fetch('/api/draft/photo', {
        method: 'PUT',
        headers: { 'Content-Type': file.type },
        body: file,
      });
      if (!res.ok) {
        setMessage(await res.text(), 'error');
        return;
      }
      photoReady = (await res.json()).photoAttached;
      refreshButtons();
    });

    statusEl.addEventListener('change', saveDraft);
    noteEl.addEventListener('change', saveDraft);

    submitButtons.forEach((btn) => {
      btn.addEventListener('click', async () => {
        sending = true;
        refreshButtons();
        try {
          await saveDraft();
          const location = await position();
          const res = await fetch('/api/reports', {
            method: 'POST',
            headers: { 'Content-Type': 'application/json' },
            body: JSON.stringify({ type: btn.dataset.kind, location }),
          });
          if (!res.ok) {
            setMessage(await res.text(), 'error');
            return;
          }
          const data = await res.json();
          photoReady = false;
          photoEl.value = '';
          setMessage(data.message, 'ok');
          setTimeout(() => window.location.reload(), 1500);
        } finally {
          sending = false;
          refreshButtons();
        }
      });
    });

    insightBtn.addEventListener('click', async () => {
      insightBtn.disabled = true;
      insightEl.textContent = 'Menganalisis...';
      try {
        const res = await fetch('/api/insight', { method: 'POST' });
        const data = await res.json();
        insightEl.textContent = data.text;
      } finally {
        insightBtn.disabled = false;
      }
    });

    refreshButtons();
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceStatus, AttendanceType};
    use crate::stats::build_dashboard;
    use chrono::{TimeZone, Utc};

    fn wib() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    fn draft() -> DraftView {
        DraftView {
            status: AttendanceStatus::Izin,
            note: String::new(),
            photo_attached: false,
            pending: false,
            can_submit: false,
        }
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<b>"Ali" & 'Umar'</b>"#),
            "&lt;b&gt;&quot;Ali&quot; &amp; &#39;Umar&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn user_text_cannot_inject_placeholders() {
        assert_eq!(escape_html("{{TOTAL}}"), "&#123;&#123;TOTAL}}");
    }

    #[test]
    fn photo_cell_only_embeds_image_data() {
        assert_eq!(photo_cell(None), "-");
        assert_eq!(photo_cell(Some("javascript:alert(1)")), "-");
        assert!(photo_cell(Some("data:image/jpeg;base64,/9j/")).contains(r#"src="data:image/jpeg;base64,/9j/""#));
    }

    #[test]
    fn page_keeps_photo_after_failed_submit() {
        // photoReady only flips back on a successful response
        let finally_block = INDEX_HTML
            .split("} finally {")
            .nth(1)
            .and_then(|rest| rest.split('}').next())
            .unwrap();
        assert!(!finally_block.contains("photoReady"));
        assert!(INDEX_HTML.contains("photoReady = false;\n          photoEl.value = '';"));
    }

    #[test]
    fn renders_empty_state() {
        let dashboard = build_dashboard(&[], wib());
        let html = render_index(&UserProfile::default(), &draft(), &dashboard, &[], wib());
        assert!(html.contains("Ustadz Ahmad Fauzi"));
        assert!(html.contains(r#"<option value="Izin" selected>Izin</option>"#));
        assert!(html.contains("Belum ada laporan"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn renders_records_escaped() {
        let records = vec![AttendanceRecord {
            id: "1".to_string(),
            user_id: "u9".to_string(),
            user_name: "<script>".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 5, 1, 0, 0).unwrap(),
            kind: AttendanceType::Out,
            status: AttendanceStatus::Terlambat,
            location: None,
            photo: Some("data:image/png;base64,iVBORw0KGgo=".to_string()),
            note: Some("<img onerror=x>".to_string()),
            activity_category: None,
        }];
        let dashboard = build_dashboard(&records, wib());
        let html = render_index(&UserProfile::default(), &draft(), &dashboard, &records, wib());
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("&lt;img onerror=x&gt;"));
        assert!(html.contains("Pulang"));
        assert!(html.contains("<th>Pengirim</th>"));
        assert!(html.contains(r#"<img class="thumb" src="data:image/png;base64,iVBORw0KGgo=""#));
        assert!(html.contains("05 Jan"));
    }
}
