/// Generates the downloadable Markdown API reference.
pub fn generate_markdown_docs() -> String {
    let mut markdown = String::new();

    markdown.push_str("# Veriflow API Documentation\n\n");
    markdown.push_str("All endpoints require `Authorization: Bearer <token>`. Admin endpoints additionally require the `role: admin` claim.\n\n");

    markdown.push_str("## Verification\n\n");
    markdown.push_str("### POST /api/verification\n\n");
    markdown.push_str("**Description:** Submit identity evidence (multipart/form-data with parts `idFile`, `proofFile`, `selfieFile`; `.jpg/.jpeg/.png/.pdf`, max 50MB each). Fails with 409 while a pending verification exists.\n\n");
    markdown.push_str("**Response:**\n```json\n{\n  \"success\": true,\n  \"message\": \"Verification submitted.\",\n  \"id\": \"uuid\",\n  \"id_document_url\": \"/api/verification/file/{subject}/20240101120000_ab12cd34_id.jpg\",\n  \"residency_proof_url\": \"...\",\n  \"selfie_url\": \"...\"\n}\n```\n\n");

    markdown.push_str("### GET /api/verification/mine\n\n");
    markdown.push_str("**Description:** Latest verification for the caller, or `{\"has_verification\": false}`.\n\n");

    markdown.push_str("### POST /api/verification/appeal\n\n");
    markdown.push_str("**Description:** Appeal the caller's latest verification. Only rejected verifications can be appealed; the verification returns to pending.\n\n");
    markdown.push_str("**Request:**\n```json\n{ \"message\": \"The photo was taken in poor light, re-uploading soon.\" }\n```\n\n");

    markdown.push_str("### GET /api/verification/file/{subject_id}/{file_name}\n\n");
    markdown.push_str("**Description:** Download an evidence file. Owner or admin only.\n\n");

    markdown.push_str("## Admin\n\n");
    markdown.push_str("### GET /api/admin/verification/list?status=pending&page_size=8&cursor=\n\n");
    markdown.push_str("**Description:** Page through verifications of one status, newest first. `cursor` is the id of the last item of the previous page; a stale cursor yields 400.\n\n");
    markdown.push_str("**Response:**\n```json\n{ \"items\": [], \"next_cursor\": \"uuid\", \"has_more\": false }\n```\n\n");

    markdown.push_str("### GET /api/admin/verification/stats\n\n");
    markdown.push_str("**Description:** Counts per status.\n\n");
    markdown.push_str("**Response:**\n```json\n{ \"pending\": 3, \"approved\": 10, \"rejected\": 2 }\n```\n\n");

    markdown.push_str("### POST /api/admin/verification/{id}/approve\n\n");
    markdown.push_str("### POST /api/admin/verification/{id}/reject\n\n");
    markdown.push_str("**Request:**\n```json\n{ \"reason\": \"Document too blurry\" }\n```\n\n");
    markdown.push_str("### DELETE /api/admin/verification/{id}\n\n");
    markdown.push_str("**Description:** Administrative override delete, outside the normal workflow.\n\n");

    markdown.push_str("### GET /api/admin/appeal/list, GET /api/admin/appeal/stats\n\n");
    markdown.push_str("### POST /api/admin/appeal/{id}/approve, POST /api/admin/appeal/{id}/reject\n\n");
    markdown.push_str("**Description:** Reviewing an appeal mirrors the outcome onto the linked verification (best effort: a failed mirror is logged, the appeal's own status still commits).\n\n");

    markdown.push_str("## Errors\n\n");
    markdown.push_str("Every error body carries a machine-readable kind:\n```json\n{ \"error\": \"conflict\", \"message\": \"You already have a pending verification. Please wait for admin review.\" }\n```\n\n");
    markdown.push_str("Kinds: `unauthenticated` (401), `forbidden` (403), `invalid_upload`, `invalid_state`, `invalid_cursor`, `validation` (400), `conflict` (409), `not_found` (404), `unavailable` (503), `database`/`internal` (500).\n");

    markdown
}

/// Generates the HTML documentation landing page.
pub fn generate_documentation_html() -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Veriflow API Documentation</title>
    <meta charset="utf-8"/>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>
        body {{ font-family: -apple-system, Segoe UI, sans-serif; margin: 2rem auto; max-width: 52rem; line-height: 1.5; color: #222; }}
        h1 {{ border-bottom: 2px solid #4a6cf7; padding-bottom: .3rem; }}
        .method {{ display: inline-block; padding: 2px 8px; border-radius: 4px; color: #fff; font-size: .8rem; margin-right: .5rem; }}
        .get {{ background: #2e8b57; }}
        .post {{ background: #4a6cf7; }}
        .delete {{ background: #c0392b; }}
        .endpoint {{ margin: 1rem 0; padding: .75rem 1rem; background: #f6f8fa; border-radius: 6px; }}
        code {{ background: #eef; padding: 1px 4px; border-radius: 3px; }}
        a {{ color: #4a6cf7; }}
    </style>
</head>
<body>
    <h1>Veriflow API</h1>
    <p>Identity-verification workflow: evidence submission, admin review and appeals.
       Interactive docs: <a href="/api/docs">Swagger UI</a> · <a href="/api/redoc">Redoc</a> ·
       <a href="/docs/markdown">Markdown</a> · <a href="/docs/openapi.json">OpenAPI JSON</a></p>

    <h2>Verification</h2>
    <div class="endpoint"><span class="method post">POST</span><code>/api/verification</code> - submit three evidence files (multipart)</div>
    <div class="endpoint"><span class="method get">GET</span><code>/api/verification/mine</code> - the caller's latest verification</div>
    <div class="endpoint"><span class="method post">POST</span><code>/api/verification/appeal</code> - appeal a rejected verification</div>
    <div class="endpoint"><span class="method get">GET</span><code>/api/verification/file/{{subject_id}}/{{file_name}}</code> - download evidence (owner or admin)</div>

    <h2>Admin</h2>
    <div class="endpoint"><span class="method get">GET</span><code>/api/admin/verification/list</code> - paged review queue</div>
    <div class="endpoint"><span class="method get">GET</span><code>/api/admin/verification/stats</code> - counts per status</div>
    <div class="endpoint"><span class="method post">POST</span><code>/api/admin/verification/{{id}}/approve</code> · <code>/reject</code></div>
    <div class="endpoint"><span class="method delete">DELETE</span><code>/api/admin/verification/{{id}}</code> - administrative delete</div>
    <div class="endpoint"><span class="method get">GET</span><code>/api/admin/appeal/list</code> · <code>/stats</code></div>
    <div class="endpoint"><span class="method post">POST</span><code>/api/admin/appeal/{{id}}/approve</code> · <code>/reject</code> - cascades onto the linked verification</div>
</body>
</html>"#
    )
}
