//! HTTP 请求封装模块
//!
//! 使用 `web_sys::fetch` 实现核心库的 `HttpClient`。
//! 任何 HTTP 状态都作为响应返回，只有请求没能完成才是错误。

use async_trait::async_trait;
use ehs_learn::{ApiError, ApiResult, HttpClient, HttpRequest, HttpResponse};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, Headers, Request, RequestInit, Response};

/// 基于 fetch 的客户端，超时通过 AbortController 实现
#[derive(Debug, Clone, Copy)]
pub struct FetchHttpClient {
    timeout_ms: u32,
}

impl FetchHttpClient {
    pub fn new(timeout_ms: u32) -> Self {
        Self { timeout_ms }
    }

    fn build(&self, req: &HttpRequest, controller: &AbortController) -> Result<Request, JsValue> {
        let headers = Headers::new()?;
        for (key, value) in &req.headers {
            headers.set(key, value)?;
        }

        let opts = RequestInit::new();
        opts.set_method(req.method.as_str());
        opts.set_headers(&headers.into());
        opts.set_signal(Some(&controller.signal()));
        if let Some(body) = &req.body {
            opts.set_body(&JsValue::from_str(body));
        }

        Request::new_with_str_and_init(&req.url, &opts)
    }

    async fn read(resp: Response) -> Result<HttpResponse, JsValue> {
        let status = resp.status();
        let content_type = resp.headers().get("content-type").ok().flatten();
        let text = JsFuture::from(resp.text()?).await?;

        Ok(HttpResponse {
            status,
            body: text.as_string().unwrap_or_default(),
            content_type,
        })
    }
}

fn js_error(op: &str, e: JsValue) -> ApiError {
    ApiError::network(format!("{}: {:?}", op, e))
}

#[async_trait(?Send)]
impl HttpClient for FetchHttpClient {
    async fn send(&self, req: HttpRequest) -> ApiResult<HttpResponse> {
        let window = web_sys::window().ok_or_else(|| ApiError::network("window is not available"))?;
        let controller = AbortController::new().map_err(|e| js_error("abort controller", e))?;
        let request = self
            .build(&req, &controller)
            .map_err(|e| js_error("build request", e))?;

        // 超时后中止请求
        let abort = {
            let controller = controller.clone();
            Closure::once_into_js(move || controller.abort())
        };
        let timer = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                abort.unchecked_ref(),
                self.timeout_ms as i32,
            )
            .ok();

        let outcome = JsFuture::from(window.fetch_with_request(&request)).await;
        if let Some(handle) = timer {
            window.clear_timeout_with_handle(handle);
        }

        let response: Response = outcome
            .map_err(|e| js_error("fetch", e))?
            .dyn_into()
            .map_err(|e| js_error("response cast", e))?;

        Self::read(response)
            .await
            .map_err(|e| js_error("read body", e))
            .map_err(|e| e.in_op_with("http.send", req.url))
    }
}
