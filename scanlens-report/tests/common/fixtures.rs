//! Report fixtures

/// Smallest indexed report: one operation with one issue
pub fn minimal_indexed_report() -> &'static str {
    r#"{
  "index": {
    "injectionKeys": ["sql-injection"],
    "responseKeys": ["unexpected"],
    "responseDescriptions": ["Unexpected error"]
  },
  "paths": {
    "/pets": {
      "get": {
        "checked": true,
        "totalRequest": 3,
        "totalExpected": 2,
        "totalUnexpected": 1,
        "totalFailure": 0,
        "issues": [
          {"id": "i1", "injectionKey": 0, "apiResponseAnalysis": [{"responseKey": 0, "responseDescription": 0}]}
        ]
      }
    }
  }
}"#
}

/// Three paths, five operations, five issues.
///
/// | id | path        | method | criticality | owasp     | integral status               |
/// |----|-------------|--------|-------------|-----------|-------------------------------|
/// | i1 | /pets       | get    | 1           | none      | expected-conformity-success   |
/// | i2 | /pets       | get    | 4           | API8:2019 | unexpected-conformity-success |
/// | i3 | /pets       | post   | 3           | API3:2019 | expected-conformity-failure   |
/// | i4 | /pets/{id}  | get    | 5           | API1:2023 | successful-conformity-success |
/// | i1 | /petshop    | get    | 2           | none      | unexpected-conformity-success |
pub fn petstore_report() -> &'static str {
    r#"{
  "taskId": "task-42",
  "scanVersion": "3.1.0-rc1",
  "scanReportVersion": "2.1.0",
  "errorsOnly": false,
  "state": "finished",
  "exitCode": 0,
  "totalRequest": 40,
  "issues": 5,
  "startDate": "2026-01-05T10:00:00Z",
  "index": {
    "jsonPointers": ["/body/name"],
    "contentTypes": ["application/json"],
    "injectionKeys": ["sql-injection", "xss"],
    "injectionDescriptions": ["Injects {0} into {1}"],
    "responseKeys": ["http-status-expected", "http-status-unexpected", "schema-successful"],
    "responseDescriptions": ["Status as documented", "Undocumented status {0}", "Payload accepted"]
  },
  "paths": {
    "/pets": {
      "get": {
        "checked": true,
        "totalRequest": 10,
        "totalExpected": 8,
        "totalUnexpected": 2,
        "totalFailure": 0,
        "happyPath": {
          "success": true,
          "apiResponseAnalysis": [{"responseKey": 0, "responseDescription": 0}]
        },
        "issues": [
          {
            "id": "i1",
            "injectionKey": 0,
            "apiResponseAnalysis": [{"responseKey": 0, "responseDescription": 0}],
            "criticality": 1
          },
          {
            "id": "i2",
            "injectionKey": 1,
            "injectionDescription": 0,
            "injectionDescriptionParams": ["script", "name"],
            "apiResponseAnalysis": [
              {"responseKey": 1, "responseDescription": 1, "responseDescriptionParams": [500]}
            ],
            "criticality": 4,
            "owaspMapping": {"2019": 8, "2023": 0},
            "jsonPointer": 0,
            "request": {"url": "http://localhost/pets", "method": "GET", "contentType": 0, "curl": "curl http://localhost/pets"},
            "response": {"httpStatusCode": 500, "contentType": 0, "bodyLength": 12, "duration": 3.5}
          }
        ]
      },
      "post": {
        "checked": true,
        "totalRequest": 12,
        "totalExpected": 10,
        "totalUnexpected": 1,
        "totalFailure": 1,
        "happyPath": {
          "apiResponseAnalysis": [{"responseKey": 1}]
        },
        "issues": [
          {
            "id": "i3",
            "injectionKey": 0,
            "apiResponseAnalysis": [
              {"responseKey": 0, "responseDescription": 0},
              {"responseKey": 1, "responseDescription": 1}
            ],
            "criticality": 3,
            "owasp": 3
          }
        ]
      }
    },
    "/pets/{id}": {
      "get": {
        "checked": true,
        "totalRequest": 8,
        "totalExpected": 7,
        "totalUnexpected": 1,
        "totalFailure": 0,
        "issues": [
          {
            "id": "i4",
            "injectionKey": 1,
            "apiResponseAnalysis": [{"responseKey": 2, "responseDescription": 2}],
            "criticality": 5,
            "owaspMapping": {"2023": 1}
          }
        ]
      },
      "delete": {
        "checked": false,
        "reason": "method-not-allowed",
        "skipReasonDetails": {"allowed": ["get"]},
        "totalRequest": 0
      }
    },
    "/petshop": {
      "get": {
        "checked": true,
        "totalRequest": 10,
        "totalExpected": 9,
        "totalUnexpected": 1,
        "totalFailure": 0,
        "issues": [
          {
            "id": "i1",
            "apiResponseAnalysis": [{"responseKey": "http-status-unexpected", "responseDescription": "Literal"}],
            "criticality": 2
          }
        ]
      }
    }
  }
}"#
}

/// Second issue points past the end of the injection key table
pub fn report_with_bad_issue() -> &'static str {
    r#"{
  "index": {"injectionKeys": ["sql-injection"], "responseKeys": ["expected"]},
  "paths": {
    "/users": {
      "get": {
        "checked": true,
        "issues": [
          {"id": "u1", "injectionKey": 0, "apiResponseAnalysis": [{"responseKey": 0}]},
          {"id": "u2", "injectionKey": 7, "apiResponseAnalysis": [{"responseKey": 0}]},
          {"id": "u3", "injectionKey": 0, "apiResponseAnalysis": [{"responseKey": 0}]}
        ]
      }
    }
  }
}"#
}

/// Errors-only report whose buckets are {2, 1, 0, 3, 4, 0}
pub fn errors_only_report() -> String {
    let mut issues = Vec::new();
    let buckets: [(&str, usize, usize); 5] = [
        // response key, analysis entries, count
        ("http-status-expected", 1, 2),
        ("http-status-unexpected", 1, 1),
        ("http-status-expected", 2, 3),
        ("http-status-unexpected", 2, 4),
        ("http-status-successful", 1, 0),
    ];
    let mut n = 0;
    for (key, entries, count) in buckets {
        for _ in 0..count {
            n += 1;
            let analysis = vec![format!(r#"{{"responseKey": "{}"}}"#, key); entries].join(", ");
            issues.push(format!(
                r#"{{"id": "e{}", "apiResponseAnalysis": [{}], "criticality": 2}}"#,
                n, analysis
            ));
        }
    }
    format!(
        r#"{{"errorsOnly": true, "totalRequest": 900, "paths": {{"/orders": {{"post": {{"checked": true, "totalRequest": 900, "issues": [{}]}}}}}}}}"#,
        issues.join(", ")
    )
}
