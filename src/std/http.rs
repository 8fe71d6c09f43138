// HTTP collaborator behind `fetch`. The evaluator never raises from here:
// transport failures come back as Err(message) and are folded into a
// {body, status: 0, ok: false} result dict.

const MAX_REDIRECTS: u32 = 8;

pub fn http_request(
    method: &str,
    url: &str,
    body: &str,
    headers: &[(String, String)],
) -> Result<(u16, String), String>
{
    let agent = ureq::AgentBuilder::new()
        .redirects(MAX_REDIRECTS)
        .user_agent("Ironwood/3.1")
        .build();

    let mut request = agent.request(method, url).set("Connection", "close");
    let mut has_content_type = false;
    for (key, val) in headers
    {
        if key.eq_ignore_ascii_case("content-type")
        {
            has_content_type = true;
        }
        request = request.set(key, val);
    }

    let result = if body.is_empty()
    {
        request.call()
    }
    else
    {
        if !has_content_type
        {
            request = request.set("Content-Type", "application/x-www-form-urlencoded");
        }
        request.send_string(body)
    };

    match result
    {
        Ok(response) =>
        {
            let status = response.status();
            let text = response
                .into_string()
                .map_err(|err| format!("Can't read response body: {err}"))?;
            Ok((status, text))
        }
        // non-2xx is still a response, not a transport failure
        Err(ureq::Error::Status(status, response)) =>
        {
            let text = response.into_string().unwrap_or_default();
            Ok((status, text))
        }
        Err(err) => Err(err.to_string()),
    }
}
