use crate::model::attendance::RecentEntry;
use crate::model::scan::{ScanRequest, ScanResult, ScanStatus};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "QR Attendance API",
        version = "0.1.0",
        description = r#"
## QR Attendance

Records attendance by scanning member QR codes (`CODE_FULL-NAME`).
Each day gets its own worksheet (e.g. `JUMAT_24-10-2025`) in the
attendance spreadsheet, with the columns `Kode`, `Nama` and `Waktu`.

### Scan outcomes
- `SUCCESS`: new entry recorded
- `REGISTERED`: code already scanned today, original time returned
- `INVALID_FORMAT`: payload has no `_` separator
- `CONNECTION_ERROR`: spreadsheet unreachable
- `PERSISTED_WITH_WARNING`: entry accepted but the spreadsheet write failed

Outcomes are reported in the JSON body; the HTTP status is 200 for all of them.
"#,
    ),
    paths(
        crate::api::attendance::index,
        crate::api::attendance::scan,
        crate::api::attendance::recent,
        crate::api::attendance::health,
    ),
    components(
        schemas(
            ScanRequest,
            ScanResult,
            ScanStatus,
            RecentEntry
        )
    ),
    tags(
        (name = "Attendance", description = "QR attendance APIs"),
        (name = "Health", description = "Liveness and store connectivity"),
    )
)]
pub struct ApiDoc;
