use chrono::{NaiveDateTime, SecondsFormat};
use rocket::http::Status;
use rocket::request::Request;
use rocket::response::content::RawJson;
use rocket::response::{self, Responder, Response};
use serde::Serializer;
use serde_json::{self, Value};

pub fn try_respond<'r>(
    req: &'r Request<'_>,
    json: &Value,
    status: Status,
) -> response::Result<'static> {
    let as_json = serde_json::to_string(&json);
    match as_json {
        Ok(json) => RawJson(json)
            .respond_to(req)
            .and_then(|resp| Response::build_from(resp).status(status).ok()),

        Err(_) => Err(Status::InternalServerError),
    }
}

pub fn serialize_date<S>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let s = date.and_utc().to_rfc3339_opts(SecondsFormat::Millis, true);
    serializer.serialize_str(&s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Stamp {
        #[serde(serialize_with = "serialize_date")]
        at: NaiveDateTime,
    }

    #[test]
    fn dates_are_rfc3339_with_millis() {
        let at = NaiveDate::from_ymd_opt(2018, 6, 1)
            .and_then(|d| d.and_hms_milli_opt(12, 30, 5, 42))
            .unwrap();
        let json = serde_json::to_string(&Stamp { at }).unwrap();
        assert_eq!(json, r#"{"at":"2018-06-01T12:30:05.042Z"}"#);
    }
}
