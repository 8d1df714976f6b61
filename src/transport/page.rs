//! Embedded chat page: report panel on the left, chat on the right

pub const CHAT_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Geospatial Analysis Chat</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }

        body {
            font-family: system-ui, -apple-system, 'Segoe UI', Roboto, sans-serif;
            background: #f8f9fa;
            color: #333;
            height: 100vh;
            overflow: hidden;
        }

        .row { display: flex; height: 100vh; }
        .col { height: 100vh; overflow-y: auto; transition: width 0.2s ease; }
        .col.hidden { display: none; }

        #report-column { padding: 20px; background: #f8f9fa; }
        #chat-column {
            padding: 20px;
            background: #fff;
            border-left: 1px solid #dee2e6;
            display: flex;
            flex-direction: column;
        }

        .report-header { text-align: center; margin-bottom: 20px; }
        .report-header h5 { color: #495057; margin-bottom: 10px; font-size: 1.1rem; }

        #report-content {
            height: calc(100vh - 150px);
            overflow-y: auto;
            padding: 20px;
            background: #fff;
            border: 1px solid #dee2e6;
            border-radius: 8px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.1);
            line-height: 1.6;
        }
        #report-content table { border-collapse: collapse; margin: 12px 0; }
        #report-content th, #report-content td { border: 1px solid #dee2e6; padding: 6px 10px; }
        #report-content pre { background: #f1f3f5; padding: 10px; border-radius: 6px; overflow-x: auto; }
        #report-content h1, #report-content h2, #report-content h3 { margin: 16px 0 8px; }

        .report-empty, .report-loading { text-align: center; margin-top: 100px; padding: 40px; color: #6c757d; }
        .report-empty-icon { font-size: 48px; color: #dee2e6; margin-bottom: 20px; }
        .report-empty p { font-style: italic; }
        .spinner {
            width: 40px; height: 40px; margin: 0 auto;
            border: 4px solid #dee2e6; border-top-color: #007bff;
            border-radius: 50%; animation: spin 1s linear infinite;
        }
        @keyframes spin { to { transform: rotate(360deg); } }

        .card.report-meta { border: 1px solid #dee2e6; border-radius: 6px; padding: 10px 14px; margin-bottom: 15px; }
        .alert { border-radius: 6px; padding: 14px 18px; margin: 20px; }
        .alert hr { margin: 10px 0; border: none; border-top: 1px solid rgba(0,0,0,0.1); }
        .alert ul { margin-left: 20px; }
        .alert-warning { background: #fff3cd; color: #664d03; }
        .alert-danger { background: #f8d7da; color: #721c24; }

        .status { display: inline-block; }
        .status-empty { color: #6c757d; font-style: italic; }
        .status-loading { color: #007bff; }
        .status-loaded { color: #28a745; font-weight: bold; }
        .status-time { color: #6c757d; font-size: 0.8em; }
        .status-error { color: #dc3545; font-weight: bold; }

        #conversation { flex: 1; overflow-y: auto; margin-bottom: 12px; }
        .entry { margin-bottom: 15px; }
        .entry .who { font-weight: bold; margin-bottom: 5px; }
        .entry.user .who { color: #007bff; }
        .entry.agent .who { color: #28a745; }
        .entry.error .who { color: #dc3545; }
        .entry .bubble { padding: 10px; border-radius: 10px; white-space: pre-wrap; }
        .entry.user .bubble { background: #e3f2fd; }
        .entry.agent .bubble { background: #f8f9fa; }
        .entry.error .bubble { background: #f8d7da; color: #721c24; }

        #query-form { display: flex; gap: 8px; }
        #query-input { flex: 1; padding: 10px; border: 1px solid #ced4da; border-radius: 6px; font-size: 0.95rem; }
        #send-button { padding: 10px 18px; border: none; border-radius: 6px; background: #007bff; color: #fff; cursor: pointer; }
        #send-button:disabled { background: #9ec5fe; cursor: wait; }

        #examples { margin-top: 10px; font-size: 0.85rem; color: #6c757d; }
        #examples button {
            display: block; width: 100%; text-align: left; margin-top: 4px;
            background: none; border: 1px dashed #ced4da; border-radius: 4px;
            padding: 4px 8px; color: #495057; cursor: pointer;
        }

        #session-info { font-size: 0.75rem; color: #adb5bd; margin-top: 8px; }

        #minimize-button {
            position: fixed; top: 16px; right: 16px;
            width: 36px; height: 36px; border-radius: 50%;
            border: none; background: #6c757d; color: #fff;
            font-size: 20px; cursor: pointer; z-index: 10;
        }
    </style>
</head>
<body>
    <button id="minimize-button" title="Toggle chat panel">−</button>
    <div class="row">
        <div id="report-column" class="col" style="width: 66.666%">
            <div class="report-header">
                <h5>&#128202; Territory Analysis Report</h5>
                <div id="report-status"></div>
            </div>
            <div id="report-content"></div>
        </div>
        <div id="chat-column" class="col" style="width: 33.333%">
            <div id="conversation"></div>
            <form id="query-form">
                <input id="query-input" type="text" placeholder="Enter your query here..." autocomplete="off">
                <button id="send-button" type="submit">Send</button>
            </form>
            <div id="examples"></div>
            <div id="session-info"></div>
        </div>
    </div>

    <script>
        const $ = (id) => document.getElementById(id);

        function escapeHtml(text) {
            const div = document.createElement('div');
            div.textContent = text;
            return div.innerHTML;
        }

        function applyLayout(layout) {
            $('report-column').style.width = (layout.report_width / 12 * 100) + '%';
            $('chat-column').style.width = (layout.chat_width / 12 * 100) + '%';
            $('chat-column').classList.toggle('hidden', layout.chat_width === 0);
            $('minimize-button').textContent = layout.button_label;
        }

        function render(state) {
            $('conversation').innerHTML = state.conversation.map((entry) => {
                const cls = entry.is_error ? 'entry error' : 'entry ' + entry.role;
                return '<div class="' + cls + '"><div class="who">' + escapeHtml(entry.label) +
                    ':</div><div class="bubble">' + escapeHtml(entry.text) + '</div></div>';
            }).join('');
            $('report-content').innerHTML = state.report_html;
            $('report-status').innerHTML = state.status_html;
            $('session-info').textContent = 'Session ' + state.session_id + ' · thread ' + state.thread_id +
                (state.memory_enabled ? ' · memory on (' + state.turns + ' turns)' : ' · memory off');
            applyLayout(state.layout);
        }

        async function refresh() {
            const res = await fetch('/api/state');
            if (res.ok) render(await res.json());
        }

        async function send(message) {
            $('send-button').disabled = true;
            $('report-status').innerHTML = '<small class="status status-loading">Loading report...</small>';
            try {
                const res = await fetch('/api/chat', {
                    method: 'POST',
                    headers: { 'Content-Type': 'application/json' },
                    body: JSON.stringify({ message: message })
                });
                const body = await res.json();
                if (res.ok) {
                    render(body);
                    if (body.accepted) $('query-input').value = '';
                } else {
                    alert(body.error || 'Request failed');
                }
            } finally {
                $('send-button').disabled = false;
            }
        }

        $('query-form').addEventListener('submit', (event) => {
            event.preventDefault();
            send($('query-input').value);
        });

        $('minimize-button').addEventListener('click', async () => {
            const res = await fetch('/api/layout/toggle', { method: 'POST' });
            if (res.ok) applyLayout(await res.json());
        });

        async function loadExamples() {
            const res = await fetch('/api/examples');
            if (!res.ok) return;
            const body = await res.json();
            const box = $('examples');
            box.textContent = 'Try:';
            body.example_queries.forEach((q) => {
                const button = document.createElement('button');
                button.type = 'button';
                button.textContent = q;
                button.addEventListener('click', () => { $('query-input').value = q; });
                box.appendChild(button);
            });
        }

        refresh();
        loadExamples();
    </script>
</body>
</html>
"#;
