use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "Request duration in seconds. Tagged with method, status.",
};

pub const CITY_UPDATE_CONFLICT: MetricDef = MetricDef {
    name: "city.update.conflict",
    metric_type: MetricType::Counter,
    description: "City updates that lost the race between read and conditional write",
};

pub const WEBHOOK_DELIVERY_SUCCEEDED: MetricDef = MetricDef {
    name: "webhook.delivery.succeeded",
    metric_type: MetricType::Counter,
    description: "Webhook deliveries answered with a 2xx status",
};

pub const WEBHOOK_DELIVERY_FAILED: MetricDef = MetricDef {
    name: "webhook.delivery.failed",
    metric_type: MetricType::Counter,
    description: "Webhook deliveries that failed. Tagged with reason.",
};

pub const WEBHOOK_DELIVERY_DURATION: MetricDef = MetricDef {
    name: "webhook.delivery.duration",
    metric_type: MetricType::Histogram,
    description: "Time until a webhook delivery returned or failed, in seconds",
};

pub const ALL_METRICS: &[MetricDef] = &[
    REQUEST_DURATION,
    CITY_UPDATE_CONFLICT,
    WEBHOOK_DELIVERY_SUCCEEDED,
    WEBHOOK_DELIVERY_FAILED,
    WEBHOOK_DELIVERY_DURATION,
];
