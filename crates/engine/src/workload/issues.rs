// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed task corpus for the cascade workload, drawn round-robin so task
//! counts beyond the corpus size repeat deterministically.

pub struct Issue {
    pub title: &'static str,
    pub code: &'static str,
}

pub const ISSUES: [Issue; 4] = [
    Issue {
        title: "Pagination skips the last page when total is an exact multiple of page_size",
        code: "def page_count(total, page_size):\n    return total // page_size\n\ndef fetch_all(client, total, page_size):\n    pages = []\n    for i in range(page_count(total, page_size)):\n        pages.append(client.fetch(offset=i * page_size, limit=page_size))\n    return pages",
    },
    Issue {
        title: "Cache returns stale entries because invalidation races the refresh thread",
        code: "class Cache:\n    def get(self, key):\n        if key in self.store:\n            return self.store[key]\n        value = self.load(key)\n        self.store[key] = value\n        return value\n\n    def invalidate(self, key):\n        del self.store[key]",
    },
    Issue {
        title: "CSV importer crashes on rows with an empty trailing field",
        code: "def parse_row(line):\n    fields = line.strip().split(',')\n    return {\n        'id': int(fields[0]),\n        'name': fields[1],\n        'amount': float(fields[2]),\n    }",
    },
    Issue {
        title: "Retry helper doubles the request body on every retry attempt",
        code: "def post_with_retry(session, url, body, attempts=3):\n    for _ in range(attempts):\n        body = body + session.sign(body)\n        resp = session.post(url, data=body)\n        if resp.ok:\n            return resp\n    raise RuntimeError('all retries failed')",
    },
];
