use crate::model::attendance::RecentEntry;
use crate::utils::html::escape;

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="id">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Absensi QR</title>
<style>
body { font-family: sans-serif; margin: 2rem; }
table { border-collapse: collapse; min-width: 20rem; }
th, td { border: 1px solid #ccc; padding: .4rem .8rem; text-align: left; }
#status { margin: 1rem 0; font-weight: bold; }
</style>
</head>
<body>
<h1>Absensi QR</h1>
<form id="scan-form">
<input id="qr_data" name="qr_data" autofocus autocomplete="off" placeholder="Scan QR code">
<button type="submit">Kirim</button>
</form>
<div id="status"></div>
<h2>Absensi Terbaru</h2>
<table>
<thead><tr><th>Nama</th><th>Waktu</th></tr></thead>
<tbody id="recent">
"#;

const PAGE_TAIL: &str = r#"</tbody>
</table>
<script>
const form = document.getElementById('scan-form');
const input = document.getElementById('qr_data');
const status = document.getElementById('status');
const recent = document.getElementById('recent');

function row(name, time) {
  const tr = document.createElement('tr');
  for (const text of [name, time]) {
    const td = document.createElement('td');
    td.textContent = text;
    tr.appendChild(td);
  }
  return tr;
}

form.addEventListener('submit', async (event) => {
  event.preventDefault();
  const res = await fetch('/scan', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify({ qr_data: input.value })
  });
  // Rate limit rejections come back as plain text
  const text = await res.text();
  let data = null;
  try {
    data = JSON.parse(text);
  } catch (_) {}
  input.value = '';
  if (!res.ok || !data) {
    status.textContent = (data && data.error) || text || `HTTP ${res.status}`;
    return;
  }
  status.textContent = `${data.status}: ${data.nama} (${data.waktu})`;
  if (data.recent_attendance) {
    recent.replaceChildren(...data.recent_attendance.map(r => row(r.Nama, r.Waktu)));
  }
});
</script>
</body>
</html>
"#;

/// Renders the attendance page. Names come from scanned input, so every
/// cell is escaped.
pub fn render_index(recent: &[RecentEntry]) -> String {
    let mut page = String::from(PAGE_HEAD);

    if recent.is_empty() {
        page.push_str("<tr><td colspan=\"2\">Belum ada absensi hari ini</td></tr>\n");
    }
    for entry in recent {
        page.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            escape(&entry.name),
            escape(&entry.time)
        ));
    }

    page.push_str(PAGE_TAIL);
    page
}
